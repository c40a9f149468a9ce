//! Event reminders: a min-ordered queue of one-shot alerts.
//!
//! A reminder fires `lead` before the event's time-of-day on the day it was
//! scheduled, no matter which date the event was filed under. Reminders whose
//! fire instant has already passed at scheduling time are never armed.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use log::{info, warn};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::model::ItemId;

pub type ReminderId = u64;

pub const DEFAULT_LEAD_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub event_id: ItemId,
    pub title: String,
    pub fire_at: NaiveDateTime,
}

/// Whether system notifications may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn label(&self) -> &'static str {
        match self {
            Permission::Default => "not asked",
            Permission::Granted => "on",
            Permission::Denied => "off",
        }
    }
}

/// The system-level half of a fired reminder.
pub trait Notifier {
    fn permission(&self) -> Permission;

    fn request_permission(&mut self) -> Permission;

    /// Overrides the permission, e.g. when the user flips it at runtime.
    fn set_permission(&mut self, permission: Permission);

    fn notify(&mut self, title: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct ReminderQueue {
    lead: Duration,
    next_id: ReminderId,
    heap: BinaryHeap<Reverse<(NaiveDateTime, ReminderId)>>,
    pending: HashMap<ReminderId, Reminder>,
}

impl Default for ReminderQueue {
    fn default() -> Self {
        ReminderQueue::new(Duration::seconds(DEFAULT_LEAD_SECS))
    }
}

impl ReminderQueue {
    pub fn new(lead: Duration) -> Self {
        ReminderQueue {
            lead,
            next_id: 1,
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// Arms a reminder for `time` today, `lead` early. Returns `None` when
    /// that instant is not strictly after `now`.
    pub fn schedule(
        &mut self,
        event_id: &str,
        title: &str,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Option<ReminderId> {
        let fire_at = match now.date().and_time(time).checked_sub_signed(self.lead) {
            Some(fire_at) if fire_at > now => fire_at,
            skipped => {
                info!(
                    "event=reminder_skipped module=reminder event_id={} fire_at={:?}",
                    event_id, skipped
                );
                return None;
            }
        };
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((fire_at, id)));
        self.pending.insert(
            id,
            Reminder {
                id,
                event_id: event_id.to_string(),
                title: title.to_string(),
                fire_at,
            },
        );
        info!(
            "event=reminder_armed module=reminder id={} event_id={} fire_at={}",
            id, event_id, fire_at
        );
        Some(id)
    }

    /// Returns true if the reminder was still pending.
    pub fn cancel(&mut self, id: ReminderId) -> bool {
        let removed = self.pending.remove(&id).is_some();
        if removed {
            info!("event=reminder_cancelled module=reminder id={}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending fire instant.
    pub fn next_fire_at(&self) -> Option<NaiveDateTime> {
        self.pending.values().map(|r| r.fire_at).min()
    }

    /// Removes and returns every pending reminder due at `now`, earliest first.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let mut due = Vec::new();
        while let Some(Reverse((at, id))) = self.heap.peek().copied() {
            if at > now {
                break;
            }
            self.heap.pop();
            if let Some(reminder) = self.pending.remove(&id) {
                due.push(reminder);
            }
        }
        due
    }
}

pub fn reminder_message(title: &str, lead: Duration) -> String {
    if lead <= Duration::zero() {
        return format!("{} starts now!", title);
    }
    format!("{} starts in {}!", title, describe_lead(lead))
}

pub fn alert_text(title: &str, lead: Duration) -> String {
    format!("⏰ Reminder: {}", reminder_message(title, lead))
}

fn describe_lead(lead: Duration) -> String {
    let secs = lead.num_seconds();
    if secs % 60 == 0 {
        match secs / 60 {
            1 => "1 minute".to_string(),
            n => format!("{} minutes", n),
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", secs)
    }
}

/// Raises fired reminders. The system notification is shown only if the
/// notifier's permission is granted at this moment; the returned alert texts
/// are always produced and must be shown modally by the caller.
pub fn dispatch(fired: &[Reminder], lead: Duration, notifier: &mut dyn Notifier) -> Vec<String> {
    let mut alerts = Vec::with_capacity(fired.len());
    for reminder in fired {
        if notifier.permission() == Permission::Granted {
            let body = reminder_message(&reminder.title, lead);
            if let Err(err) = notifier.notify("⏰ Reminder", &body) {
                warn!(
                    "event=notify_failed module=reminder id={} error={}",
                    reminder.id, err
                );
            }
        }
        info!(
            "event=reminder_fired module=reminder id={} event_id={}",
            reminder.id, reminder.event_id
        );
        alerts.push(alert_text(&reminder.title, lead));
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn cancelled_reminders_leave_the_schedule() {
        let mut queue = ReminderQueue::default();
        let first = queue.schedule("a", "A", time(9, 0), at(8, 0, 0)).unwrap();
        queue.schedule("b", "B", time(10, 0), at(8, 0, 0)).unwrap();
        assert_eq!(queue.next_fire_at(), Some(at(8, 59, 0)));
        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));
        assert_eq!(queue.next_fire_at(), Some(at(9, 59, 0)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn oversized_lead_never_arms() {
        let mut queue = ReminderQueue::new(Duration::days(1_000_000_000));
        assert_eq!(queue.schedule("a", "A", time(9, 0), at(8, 0, 0)), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn lead_is_described_in_words() {
        assert_eq!(
            alert_text("Standup", Duration::seconds(60)),
            "⏰ Reminder: Standup starts in 1 minute!"
        );
        assert_eq!(
            reminder_message("Lunch", Duration::minutes(5)),
            "Lunch starts in 5 minutes!"
        );
        assert_eq!(
            reminder_message("Call", Duration::seconds(30)),
            "Call starts in 30 seconds!"
        );
        assert_eq!(
            reminder_message("Call", Duration::seconds(1)),
            "Call starts in 1 second!"
        );
        assert_eq!(
            reminder_message("Call", Duration::zero()),
            "Call starts now!"
        );
    }
}
