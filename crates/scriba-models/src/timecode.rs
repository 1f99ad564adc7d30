//! Timecode formatting for the subtitle export formats.
//!
//! Converts whole-millisecond offsets to the three textual time styles the
//! exporters use. All conversions truncate; there is no rounding beyond
//! whole milliseconds.

/// Milliseconds per frame at the fixed 25 fps SMPTE rate.
const MS_PER_FRAME: u64 = 40;

/// The textual time styles used by the export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeStyle {
    /// `HH:MM:SS,mmm` (SubRip)
    Standard,
    /// `HH:MM:SS.mmm` (WebVTT, CSV)
    Web,
    /// `HH:MM:SS:FF` at 25 fps (frame-accurate variant)
    Smpte,
}

/// Format a millisecond offset in the given style.
///
/// # Examples
/// ```
/// use scriba_models::timecode::{format_timecode, TimecodeStyle};
/// assert_eq!(format_timecode(3_723_456, TimecodeStyle::Standard), "01:02:03,456");
/// assert_eq!(format_timecode(3_723_456, TimecodeStyle::Web), "01:02:03.456");
/// ```
pub fn format_timecode(ms: u64, style: TimecodeStyle) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1_000;
    match style {
        TimecodeStyle::Standard => format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms % 1_000),
        TimecodeStyle::Web => format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms % 1_000),
        TimecodeStyle::Smpte => {
            format!("{:02}:{:02}:{:02}:{:02}", h, m, s, (ms % 1_000) / MS_PER_FRAME)
        }
    }
}

/// Parse a timecode back to milliseconds.
///
/// Inverse of [`format_timecode`]; for `Smpte` the result is truncated to
/// frame precision, for the other styles the original millisecond value is
/// recovered exactly.
pub fn parse_timecode(tc: &str, style: TimecodeStyle) -> Option<u64> {
    let (sep, sub_scale) = match style {
        TimecodeStyle::Standard => (',', 1),
        TimecodeStyle::Web => ('.', 1),
        TimecodeStyle::Smpte => (':', MS_PER_FRAME),
    };

    let (hms, sub) = match style {
        // HH:MM:SS:FF splits on the last colon
        TimecodeStyle::Smpte => tc.rsplit_once(sep)?,
        _ => tc.split_once(sep)?,
    };

    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.parse().ok()?;
    let m: u64 = parts.next()?.parse().ok()?;
    let s: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m > 59 || s > 59 {
        return None;
    }

    let sub: u64 = sub.parse().ok()?;
    let sub_ms = sub * sub_scale;
    if sub_ms >= 1_000 {
        return None;
    }

    Some(h * 3_600_000 + m * 60_000 + s * 1_000 + sub_ms)
}

/// Convert a second offset to whole milliseconds, truncating.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds <= 0.0 {
        0
    } else {
        (seconds * 1000.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_standard() {
        assert_eq!(format_timecode(0, TimecodeStyle::Standard), "00:00:00,000");
        assert_eq!(format_timecode(3_723_456, TimecodeStyle::Standard), "01:02:03,456");
        assert_eq!(format_timecode(59_999, TimecodeStyle::Standard), "00:00:59,999");
    }

    #[test]
    fn test_format_web() {
        assert_eq!(format_timecode(3_723_456, TimecodeStyle::Web), "01:02:03.456");
        assert_eq!(format_timecode(1_500, TimecodeStyle::Web), "00:00:01.500");
    }

    #[test]
    fn test_format_smpte_25fps() {
        // 456 ms / 40 ms per frame = frame 11
        assert_eq!(format_timecode(3_723_456, TimecodeStyle::Smpte), "01:02:03:11");
        assert_eq!(format_timecode(999, TimecodeStyle::Smpte), "00:00:00:24");
        assert_eq!(format_timecode(1_000, TimecodeStyle::Smpte), "00:00:01:00");
    }

    #[test]
    fn test_round_trip_standard_and_web() {
        for ms in [0u64, 1, 999, 1_000, 59_999, 3_600_000, 3_723_456, 86_399_999] {
            let tc = format_timecode(ms, TimecodeStyle::Standard);
            assert_eq!(parse_timecode(&tc, TimecodeStyle::Standard), Some(ms));

            let tc = format_timecode(ms, TimecodeStyle::Web);
            assert_eq!(parse_timecode(&tc, TimecodeStyle::Web), Some(ms));
        }
    }

    #[test]
    fn test_round_trip_smpte_frame_precision() {
        // SMPTE truncates to 40 ms frames
        let tc = format_timecode(3_723_456, TimecodeStyle::Smpte);
        assert_eq!(parse_timecode(&tc, TimecodeStyle::Smpte), Some(3_723_440));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timecode("", TimecodeStyle::Standard), None);
        assert_eq!(parse_timecode("01:02:03", TimecodeStyle::Standard), None);
        assert_eq!(parse_timecode("01:02:03.456", TimecodeStyle::Standard), None);
        assert_eq!(parse_timecode("aa:bb:cc,ddd", TimecodeStyle::Standard), None);
        assert_eq!(parse_timecode("00:61:00,000", TimecodeStyle::Standard), None);
    }

    #[test]
    fn test_seconds_to_ms_truncates() {
        assert_eq!(seconds_to_ms(1.2345), 1234);
        assert_eq!(seconds_to_ms(0.0), 0);
        assert_eq!(seconds_to_ms(-3.0), 0);
    }
}
