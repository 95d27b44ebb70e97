use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Clock face for the quiz timer: `mm:ss`, or `h:mm:ss` from one hour up.
#[must_use]
pub fn format_timer(secs: u32) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_format() {
        assert_eq!(format_timer(0), "00:00");
        assert_eq!(format_timer(65), "01:05");
        assert_eq!(format_timer(3599), "59:59");
        assert_eq!(format_timer(10_800), "3:00:00");
        assert_eq!(format_timer(16_199), "4:29:59");
    }
}
