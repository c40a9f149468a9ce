//! Wall-clock access and the repeating tick that drives the countdown.
//!
//! Everything time-dependent in the planner takes its "now" from a [`Clock`]
//! so tests can move time forward by hand instead of sleeping.

use chrono::{Duration, Local, NaiveDateTime};
use std::cell::Cell;
use std::rc::Rc;

pub trait Clock {
    /// Local wall-clock time, without zone.
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

/// Cancels the [`Ticker`] it was taken from. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct TickHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TickHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// A repeating tick polled from the UI loop.
///
/// The first tick is due immediately. After a tick fires the next one is
/// armed one period after the instant it was observed, so a stalled loop
/// never produces a burst of catch-up ticks.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Option<NaiveDateTime>,
    handle: TickHandle,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Ticker {
            period,
            next_due: None,
            handle: TickHandle::default(),
        }
    }

    pub fn handle(&self) -> TickHandle {
        self.handle.clone()
    }

    /// Returns true when a tick is due at `now`.
    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        if self.handle.is_cancelled() {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                let next = now
                    .checked_add_signed(self.period)
                    .unwrap_or(NaiveDateTime::MAX);
                self.next_due = Some(next);
                true
            }
        }
    }
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

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(at(8, 0, 0));
        let other = clock.clone();
        clock.advance(Duration::seconds(90));
        assert_eq!(other.now(), at(8, 1, 30));
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let clock = ManualClock::new(at(8, 0, 0));
        let mut ticker = Ticker::new(Duration::milliseconds(1000));
        assert!(ticker.poll(clock.now()));
        clock.advance(Duration::milliseconds(200));
        assert!(!ticker.poll(clock.now()));
        clock.advance(Duration::milliseconds(800));
        assert!(ticker.poll(clock.now()));
    }

    #[test]
    fn ticker_does_not_burst_after_stall() {
        let clock = ManualClock::new(at(8, 0, 0));
        let mut ticker = Ticker::new(Duration::seconds(1));
        assert!(ticker.poll(clock.now()));
        clock.advance(Duration::seconds(10));
        assert!(ticker.poll(clock.now()));
        assert!(!ticker.poll(clock.now()));
    }

    #[test]
    fn oversized_period_saturates() {
        let mut ticker = Ticker::new(Duration::days(1_000_000_000));
        assert!(ticker.poll(at(9, 0, 0)));
        assert!(!ticker.poll(at(9, 0, 1)));
        assert!(!ticker.poll(at(23, 59, 59)));
    }

    #[test]
    fn cancelled_ticker_stays_silent() {
        let mut ticker = Ticker::new(Duration::seconds(1));
        let handle = ticker.handle();
        handle.cancel();
        assert!(!ticker.poll(at(9, 0, 0)));
        assert!(handle.is_cancelled());
    }
}
