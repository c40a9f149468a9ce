use chrono::{Duration, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use log::{debug, info};
use rand::{distributions::Alphanumeric, Rng};

use crate::countdown::{next_countdown, Countdown};
use crate::drag::{self, RowSpan};
use crate::format::{format_clock, format_display_date, parse_time_of_day};
use crate::reminder::{Reminder, ReminderId, ReminderQueue};

pub type ItemId = String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("{0} is required")]
    BlankInput(&'static str),
    #[error("invalid time (use HH:MM): {0}")]
    InvalidTime(String),
    #[error("task not found: {0}")]
    TaskNotFound(ItemId),
    #[error("event not found: {0}")]
    EventNotFound(ItemId),
    #[error("note not found: {0}")]
    NoteNotFound(ItemId),
    #[error("no {category} list under {date}")]
    CategoryNotFound { date: String, category: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: ItemId,
    pub text: String,
    pub done: bool,
}

/// Tasks filed under one date, grouped by category in creation order.
#[derive(Debug, Clone)]
pub struct TaskDay {
    pub date: String,
    pub categories: IndexMap<String, Vec<TaskItem>>,
}

impl TaskDay {
    pub fn heading(&self) -> String {
        format!("📅 {}", format_display_date(&self.date))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventItem {
    pub id: ItemId,
    pub title: String,
    pub time: NaiveTime,
    pub reminder: Option<ReminderId>,
}

impl EventItem {
    pub fn display_text(&self) -> String {
        format!("{} - {}", format_clock(self.time), self.title)
    }
}

#[derive(Debug, Clone)]
pub struct EventDay {
    pub date: String,
    pub events: Vec<EventItem>,
}

impl EventDay {
    pub fn heading(&self) -> String {
        format!("📅 {}", format_display_date(&self.date))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub id: ItemId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntry {
    pub logged_at: NaiveDateTime,
    pub mood: String,
}

impl MoodEntry {
    pub fn display_text(&self) -> String {
        format!("{} — {}", format_clock(self.logged_at.time()), self.mood)
    }
}

/// Where a task currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub date: String,
    pub category: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64 * 100.0
        }
    }

    pub fn ratio(&self) -> f64 {
        self.percent() / 100.0
    }
}

/// The whole planner state for one session.
#[derive(Debug, Default)]
pub struct Planner {
    task_days: IndexMap<String, TaskDay>,
    event_days: IndexMap<String, EventDay>,
    notes: Vec<NoteEntry>,
    moods: Vec<MoodEntry>,
    reminders: ReminderQueue,
    dragging: Option<ItemId>,
}

impl Planner {
    pub fn new(reminder_lead: Duration) -> Self {
        Planner {
            reminders: ReminderQueue::new(reminder_lead),
            ..Planner::default()
        }
    }

    pub fn task_days(&self) -> impl Iterator<Item = &TaskDay> {
        self.task_days.values()
    }

    pub fn event_days(&self) -> impl Iterator<Item = &EventDay> {
        self.event_days.values()
    }

    pub fn notes(&self) -> &[NoteEntry] {
        &self.notes
    }

    pub fn moods(&self) -> &[MoodEntry] {
        &self.moods
    }

    pub fn reminders(&self) -> &ReminderQueue {
        &self.reminders
    }

    pub fn add_task(&mut self, date: &str, category: &str, text: &str) -> Result<ItemId, PlannerError> {
        let date = date.trim();
        if text.trim().is_empty() {
            return Err(PlannerError::BlankInput("task"));
        }
        if date.is_empty() {
            return Err(PlannerError::BlankInput("date"));
        }
        if category.trim().is_empty() {
            return Err(PlannerError::BlankInput("category"));
        }
        let id = self.generate_id();
        let day = self
            .task_days
            .entry(date.to_string())
            .or_insert_with(|| TaskDay {
                date: date.to_string(),
                categories: IndexMap::new(),
            });
        day.categories
            .entry(category.to_string())
            .or_default()
            .push(TaskItem {
                id: id.clone(),
                text: text.to_string(),
                done: false,
            });
        debug!(
            "event=task_added module=model id={} date={} category={}",
            id, date, category
        );
        Ok(id)
    }

    pub fn find_task(&self, id: &str) -> Option<TaskLocation> {
        self.task_days.values().find_map(|day| {
            day.categories.iter().find_map(|(category, items)| {
                items.iter().position(|t| t.id == id).map(|index| TaskLocation {
                    date: day.date.clone(),
                    category: category.clone(),
                    index,
                })
            })
        })
    }

    pub fn task(&self, id: &str) -> Option<&TaskItem> {
        self.task_days
            .values()
            .flat_map(|day| day.categories.values())
            .flatten()
            .find(|t| t.id == id)
    }

    pub fn category_items(&self, date: &str, category: &str) -> Option<&[TaskItem]> {
        self.task_days
            .get(date)
            .and_then(|day| day.categories.get(category))
            .map(|items| items.as_slice())
    }

    /// Flips the done marker and returns the new value.
    pub fn toggle_task(&mut self, id: &str) -> Result<bool, PlannerError> {
        let task = self
            .task_days
            .values_mut()
            .flat_map(|day| day.categories.values_mut())
            .flatten()
            .find(|t| t.id == id)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))?;
        task.done = !task.done;
        debug!("event=task_toggled module=model id={} done={}", id, task.done);
        Ok(task.done)
    }

    /// Removes a task, dropping its category list and date heading once they
    /// are empty.
    pub fn remove_task(&mut self, id: &str) -> Result<TaskItem, PlannerError> {
        let location = self
            .find_task(id)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))?;
        let task = self
            .take_task(&location)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))?;
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
        }
        debug!("event=task_removed module=model id={}", id);
        Ok(task)
    }

    pub fn progress(&self) -> Progress {
        self.task_days
            .values()
            .flat_map(|day| day.categories.values())
            .flatten()
            .fold(Progress::default(), |mut acc, task| {
                acc.total += 1;
                if task.done {
                    acc.done += 1;
                }
                acc
            })
    }

    /// Marks a task as the in-flight drag payload.
    pub fn begin_drag(&mut self, id: &str) -> Result<(), PlannerError> {
        if self.find_task(id).is_none() {
            return Err(PlannerError::TaskNotFound(id.to_string()));
        }
        self.dragging = Some(id.to_string());
        Ok(())
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn end_drag(&mut self) -> Option<ItemId> {
        self.dragging.take()
    }

    /// Drag-over on the list `(date, category)` laid out as `rows`.
    ///
    /// The in-flight task is reinserted before the first row whose midpoint
    /// is below `pointer_y`, or appended. Hovering another category's list
    /// moves the task into it. Returns the task's new index, or `None` when
    /// nothing is being dragged.
    pub fn drag_over(
        &mut self,
        date: &str,
        category: &str,
        rows: &[RowSpan],
        pointer_y: f64,
    ) -> Result<Option<usize>, PlannerError> {
        let dragged = match self.dragging.clone() {
            Some(id) => id,
            None => return Ok(None),
        };
        if self.category_items(date, category).is_none() {
            return Err(PlannerError::CategoryNotFound {
                date: date.to_string(),
                category: category.to_string(),
            });
        }
        let source = self
            .find_task(&dragged)
            .ok_or_else(|| PlannerError::TaskNotFound(dragged.clone()))?;

        if source.date == date && source.category == category {
            let items = self.category_items_mut(date, category);
            let index = match items {
                Some(items) => drag::reorder(items, source.index, rows, pointer_y),
                None => source.index,
            };
            return Ok(Some(index));
        }

        let index = {
            let target_len = self.category_items(date, category).map_or(0, |i| i.len());
            drag::insertion_point(&rows[..rows.len().min(target_len)], pointer_y)
                .unwrap_or(target_len)
        };
        let task = self
            .take_task(&source)
            .ok_or_else(|| PlannerError::TaskNotFound(dragged.clone()))?;
        if let Some(items) = self.category_items_mut(date, category) {
            items.insert(index, task);
        }
        debug!(
            "event=task_moved module=model id={} date={} category={}",
            dragged, date, category
        );
        Ok(Some(index))
    }

    /// Moves a task `offset` places within its own list, going through the
    /// same drag path as a pointer would.
    pub fn nudge_task(&mut self, id: &str, offset: isize) -> Result<usize, PlannerError> {
        let location = self
            .find_task(id)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))?;
        let len = self
            .category_items(&location.date, &location.category)
            .map_or(0, |items| items.len());
        let target = (location.index as isize + offset).clamp(0, len as isize - 1) as usize;
        if target == location.index {
            return Ok(target);
        }
        let pointer_y = if target < location.index {
            target as f64 + 0.25
        } else {
            target as f64 + 0.75
        };
        let rows = drag::uniform_rows(0.0, 1.0, len);
        let previous = self.dragging.replace(id.to_string());
        let moved = self.drag_over(&location.date, &location.category, &rows, pointer_y);
        self.dragging = previous;
        Ok(moved?.unwrap_or(location.index))
    }

    pub fn add_event(
        &mut self,
        date: &str,
        title: &str,
        time: &str,
        now: NaiveDateTime,
    ) -> Result<ItemId, PlannerError> {
        let date = date.trim();
        if title.trim().is_empty() {
            return Err(PlannerError::BlankInput("event title"));
        }
        if time.trim().is_empty() {
            return Err(PlannerError::BlankInput("event time"));
        }
        if date.is_empty() {
            return Err(PlannerError::BlankInput("date"));
        }
        let time_of_day =
            parse_time_of_day(time).ok_or_else(|| PlannerError::InvalidTime(time.to_string()))?;
        let id = self.generate_id();
        let reminder = self.reminders.schedule(&id, title, time_of_day, now);
        if !self.event_days.contains_key(date) {
            self.event_days.shift_insert(
                0,
                date.to_string(),
                EventDay {
                    date: date.to_string(),
                    events: Vec::new(),
                },
            );
        }
        if let Some(day) = self.event_days.get_mut(date) {
            day.events.push(EventItem {
                id: id.clone(),
                title: title.to_string(),
                time: time_of_day,
                reminder,
            });
        }
        info!(
            "event=event_added module=model id={} date={} time={} reminder={}",
            id,
            date,
            format_clock(time_of_day),
            reminder.is_some()
        );
        Ok(id)
    }

    pub fn event(&self, id: &str) -> Option<&EventItem> {
        self.event_days
            .values()
            .flat_map(|day| day.events.iter())
            .find(|e| e.id == id)
    }

    /// Removes an event and cancels its pending reminder.
    pub fn remove_event(&mut self, id: &str) -> Result<EventItem, PlannerError> {
        let (day_idx, pos) = self
            .event_days
            .values()
            .enumerate()
            .find_map(|(day_idx, day)| {
                day.events
                    .iter()
                    .position(|e| e.id == id)
                    .map(|pos| (day_idx, pos))
            })
            .ok_or_else(|| PlannerError::EventNotFound(id.to_string()))?;
        let (event, now_empty) = match self.event_days.get_index_mut(day_idx) {
            Some((_, day)) => {
                let event = day.events.remove(pos);
                (event, day.events.is_empty())
            }
            None => return Err(PlannerError::EventNotFound(id.to_string())),
        };
        if now_empty {
            self.event_days.shift_remove_index(day_idx);
        }
        if let Some(reminder) = event.reminder {
            self.reminders.cancel(reminder);
        }
        debug!("event=event_removed module=model id={}", id);
        Ok(event)
    }

    pub fn event_times(&self) -> impl Iterator<Item = NaiveTime> + '_ {
        self.event_days
            .values()
            .flat_map(|day| day.events.iter().map(|e| e.time))
    }

    pub fn countdown(&self, now: NaiveDateTime) -> Countdown {
        next_countdown(self.event_times(), now)
    }

    /// Reminders due at `now`, removed from the queue.
    pub fn take_due_reminders(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let due = self.reminders.pop_due(now);
        for reminder in &due {
            if let Some(event) = self
                .event_days
                .values_mut()
                .flat_map(|day| day.events.iter_mut())
                .find(|e| e.reminder == Some(reminder.id))
            {
                event.reminder = None;
            }
        }
        due
    }

    /// Appends a trimmed note. Notes that are empty after trimming are
    /// rejected.
    pub fn add_note(&mut self, text: &str) -> Result<ItemId, PlannerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::BlankInput("note"));
        }
        let id = self.generate_id();
        self.notes.push(NoteEntry {
            id: id.clone(),
            text: text.to_string(),
        });
        debug!("event=note_added module=model id={}", id);
        Ok(id)
    }

    pub fn remove_note(&mut self, id: &str) -> Result<NoteEntry, PlannerError> {
        let pos = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| PlannerError::NoteNotFound(id.to_string()))?;
        debug!("event=note_removed module=model id={}", id);
        Ok(self.notes.remove(pos))
    }

    pub fn log_mood(&mut self, mood: &str, now: NaiveDateTime) -> Result<&MoodEntry, PlannerError> {
        if mood.trim().is_empty() {
            return Err(PlannerError::BlankInput("mood"));
        }
        self.moods.push(MoodEntry {
            logged_at: now,
            mood: mood.to_string(),
        });
        debug!("event=mood_logged module=model mood={}", mood);
        Ok(&self.moods[self.moods.len() - 1])
    }

    fn category_items_mut(&mut self, date: &str, category: &str) -> Option<&mut Vec<TaskItem>> {
        self.task_days
            .get_mut(date)
            .and_then(|day| day.categories.get_mut(category))
    }

    fn take_task(&mut self, location: &TaskLocation) -> Option<TaskItem> {
        let day = self.task_days.get_mut(&location.date)?;
        let items = day.categories.get_mut(&location.category)?;
        if location.index >= items.len() {
            return None;
        }
        let task = items.remove(location.index);
        if items.is_empty() {
            day.categories.shift_remove(&location.category);
        }
        if day.categories.is_empty() {
            self.task_days.shift_remove(&location.date);
        }
        Some(task)
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.task(id).is_some()
            || self.event(id).is_some()
            || self.notes.iter().any(|n| n.id == id)
    }

    fn generate_id(&self) -> ItemId {
        loop {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect();
            if !self.id_in_use(&id) {
                return id;
            }
        }
    }
}
