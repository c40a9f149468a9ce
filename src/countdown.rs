use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No event carries a time.
    Idle,
    /// Time left until the soonest event, never negative.
    Remaining(Duration),
}

impl Countdown {
    pub fn minutes_seconds(&self) -> Option<(i64, i64)> {
        match self {
            Countdown::Idle => None,
            Countdown::Remaining(left) => {
                let millis = left.num_milliseconds();
                Some((millis / 60_000, (millis % 60_000) / 1000))
            }
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes_seconds() {
            None => write!(f, "⏱️ Countdown: --"),
            Some((mins, secs)) => write!(f, "⏱️ Countdown: {}m {}s", mins, secs),
        }
    }
}

/// Countdown to the soonest of `times`, each anchored to today's date.
///
/// Times earlier than `now` are not moved to tomorrow: if one of them is the
/// soonest the countdown reads zero.
pub fn next_countdown<I>(times: I, now: NaiveDateTime) -> Countdown
where
    I: IntoIterator<Item = NaiveTime>,
{
    let today = now.date();
    let soonest = times.into_iter().map(|t| today.and_time(t)).min();
    match soonest {
        None => Countdown::Idle,
        Some(at) => Countdown::Remaining((at - now).max(Duration::zero())),
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

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn counts_down_to_the_soonest_event() {
        let countdown = next_countdown([time(9, 30), time(9, 0)], at(8, 50, 0));
        assert_eq!(countdown.minutes_seconds(), Some((10, 0)));
        assert_eq!(countdown.to_string(), "⏱️ Countdown: 10m 0s");

        let countdown = next_countdown([time(9, 0)], at(8, 58, 15));
        assert_eq!(countdown.to_string(), "⏱️ Countdown: 1m 45s");
    }

    #[test]
    fn past_events_clamp_to_zero() {
        let countdown = next_countdown([time(7, 0), time(12, 0)], at(8, 0, 0));
        assert_eq!(countdown, Countdown::Remaining(Duration::zero()));
        assert_eq!(countdown.to_string(), "⏱️ Countdown: 0m 0s");
    }

    #[test]
    fn no_events_is_idle() {
        let countdown = next_countdown(Vec::new(), at(8, 0, 0));
        assert_eq!(countdown, Countdown::Idle);
        assert_eq!(countdown.to_string(), "⏱️ Countdown: --");
    }
}
