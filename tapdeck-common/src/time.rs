//! Track time formatting
//!
//! Provides the position/duration display strings used by the transport
//! controls: `m:ss` below an hour, `h:mm:ss` above, and a fixed sentinel
//! when the engine cannot report a position.

/// Display string for an unknown position or duration
pub const UNKNOWN_TIME: &str = "--:--";

/// Format a track time in whole seconds as `m:ss` or `h:mm:ss`.
///
/// Negative values mean "unknown" and render as [`UNKNOWN_TIME`].
///
/// # Examples
///
/// ```
/// use tapdeck_common::time::format_track_time;
///
/// assert_eq!(format_track_time(0), "0:00");
/// assert_eq!(format_track_time(330), "5:30");
/// assert_eq!(format_track_time(3661), "1:01:01");
/// assert_eq!(format_track_time(-1), "--:--");
/// ```
pub fn format_track_time(seconds: i64) -> String {
    if seconds < 0 {
        return UNKNOWN_TIME.to_string();
    }

    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format a track time given in milliseconds.
///
/// Truncates toward zero, so 1999 ms renders as one second. Negative values
/// (the engine's unknown-position sentinel) render as [`UNKNOWN_TIME`].
pub fn format_track_time_ms(millis: i64) -> String {
    if millis < 0 {
        return UNKNOWN_TIME.to_string();
    }
    format_track_time(millis / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_minute() {
        assert_eq!(format_track_time(0), "0:00");
        assert_eq!(format_track_time(5), "0:05");
        assert_eq!(format_track_time(59), "0:59");
    }

    #[test]
    fn test_minutes() {
        assert_eq!(format_track_time(60), "1:00");
        assert_eq!(format_track_time(330), "5:30");
        assert_eq!(format_track_time(3599), "59:59");
    }

    #[test]
    fn test_hours() {
        assert_eq!(format_track_time(3600), "1:00:00");
        assert_eq!(format_track_time(3661), "1:01:01");
        assert_eq!(format_track_time(7325), "2:02:05");
    }

    #[test]
    fn test_unknown_sentinel() {
        assert_eq!(format_track_time(-1), UNKNOWN_TIME);
        assert_eq!(format_track_time(i64::MIN), UNKNOWN_TIME);
    }

    #[test]
    fn test_millis_truncation() {
        assert_eq!(format_track_time_ms(0), "0:00");
        assert_eq!(format_track_time_ms(1999), "0:01");
        assert_eq!(format_track_time_ms(200_000), "3:20");
        assert_eq!(format_track_time_ms(-1), UNKNOWN_TIME);
    }
}
