use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}:\d{2})").expect("leading time pattern is valid"));

const MISSING_SEGMENT: &str = "??";

/// Turns a `YYYY-MM-DD` picker value into the `DD/MM/YYYY` heading text.
///
/// Segments are copied as-is; nothing checks that the date exists. Missing
/// segments render as `??` and anything past the third `-` is dropped.
pub fn format_display_date(iso: &str) -> String {
    let mut parts = iso.split('-');
    let year = parts.next().unwrap_or(MISSING_SEGMENT);
    let month = parts.next().unwrap_or(MISSING_SEGMENT);
    let day = parts.next().unwrap_or(MISSING_SEGMENT);
    format!("{}/{}/{}", day, month, year)
}

/// Returns the `HH:MM` prefix of `text`, if it has one.
pub fn extract_time_of_day(text: &str) -> Option<&str> {
    LEADING_TIME_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Like [`extract_time_of_day`] but only accepts real clock times.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let raw = extract_time_of_day(text.trim())?;
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}

pub fn format_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_date_reorders_segments() {
        assert_eq!(format_display_date("2024-03-07"), "07/03/2024");
        assert_eq!(format_display_date("0099-1-002"), "002/1/0099");
    }

    #[test]
    fn display_date_degrades_without_panicking() {
        assert_eq!(format_display_date("2024"), "??/??/2024");
        assert_eq!(format_display_date(""), "??/??/");
        assert_eq!(format_display_date("2024-01-02-extra"), "02/01/2024");
    }

    #[test]
    fn extract_requires_leading_digits() {
        assert_eq!(extract_time_of_day("09:30 - Standup"), Some("09:30"));
        assert_eq!(extract_time_of_day("at 09:30"), None);
        assert_eq!(extract_time_of_day("9:30"), None);
        assert_eq!(extract_time_of_day("99:99 whatever"), Some("99:99"));
    }

    #[test]
    fn parse_rejects_impossible_times() {
        assert_eq!(
            parse_time_of_day(" 07:05 "),
            NaiveTime::from_hms_opt(7, 5, 0)
        );
        assert_eq!(parse_time_of_day("24:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
    }

    #[test]
    fn clock_is_zero_padded() {
        let t = NaiveTime::from_hms_opt(8, 4, 59).unwrap();
        assert_eq!(format_clock(t), "08:04");
    }
}
