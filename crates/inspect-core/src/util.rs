//! Shared utility functions used across multiple modules.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Next `lastModified` value for a record last stamped at `previous`.
///
/// Always strictly after `previous`, even when the clock has not advanced.
pub fn next_modified(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + TimeDelta::milliseconds(1))
}

/// Midnight (UTC) of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" INV-1 ".to_string())),
            Some("INV-1".to_string())
        );
    }

    #[test]
    fn next_modified_advances_when_clock_stalls() {
        let now = Utc::now();
        assert!(next_modified(now, now) > now);
        let later = now + TimeDelta::seconds(5);
        assert_eq!(next_modified(now, later), later);
    }

    #[test]
    fn start_of_day_truncates_to_midnight() {
        let now = "2024-03-10T17:45:12Z".parse::<DateTime<Utc>>().unwrap();
        let midnight = "2024-03-10T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(start_of_day(now), midnight);
    }
}
