//! Human readable durations.

use time::Duration;

/// Hours and minutes, e.g. `1:45`. Seconds are truncated.
pub fn format_hm(duration: Duration) -> String {
    let minutes = duration.whole_minutes().max(0);
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Decimal hours with two places, e.g. `1.75`.
pub fn format_decimal(duration: Duration) -> String {
    let hundredths = (duration.whole_seconds().max(0) * 100 + 1800) / 3600;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Compact form for dashboard cells: empty for zero, otherwise `1:45`.
pub fn format_short(duration: Duration) -> String {
    if duration <= Duration::ZERO {
        return String::new();
    }
    format_hm(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_hm(Duration::minutes(105)), "1:45");
        assert_eq!(format_hm(Duration::seconds(59)), "0:00");
        assert_eq!(format_hm(Duration::hours(26)), "26:00");
    }

    #[test]
    fn decimal_hours_round_half_up() {
        assert_eq!(format_decimal(Duration::minutes(105)), "1.75");
        assert_eq!(format_decimal(Duration::minutes(20)), "0.33");
        // 18 seconds is exactly half a hundredth of an hour
        assert_eq!(format_decimal(Duration::seconds(18)), "0.01");
    }

    #[test]
    fn short_form_hides_zero() {
        assert_eq!(format_short(Duration::ZERO), "");
        assert_eq!(format_short(Duration::minutes(5)), "0:05");
    }
}
