//! Duration strings for suspensions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Characters a duration argument may contain
pub const DURATION_CHARS: &str = "0123456789smhdw";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Parse "30m", "2h", "1d", "1h30m" into seconds
///
/// A trailing number without a unit, an unknown unit, overflow, or a zero
/// total all yield `None`.
pub fn parse_duration(input: &str) -> Option<i64> {
    let input = input.trim().to_lowercase();
    let mut total: i64 = 0;
    let mut number = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if number.is_empty() {
            return None;
        }
        let value: i64 = number.parse().ok()?;
        number.clear();

        let unit = match c {
            's' => 1,
            'm' => MINUTE,
            'h' => HOUR,
            'd' => DAY,
            'w' => WEEK,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    if !number.is_empty() || total == 0 {
        return None;
    }
    Some(total)
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}

/// "1 hour 30 minutes", "2 days", "45 seconds"
pub fn format_duration(seconds: i64) -> String {
    if seconds < MINUTE {
        plural(seconds, "second")
    } else if seconds < HOUR {
        plural(seconds / MINUTE, "minute")
    } else if seconds < DAY {
        let hours = seconds / HOUR;
        let minutes = (seconds % HOUR) / MINUTE;
        if minutes > 0 {
            format!("{} {}", plural(hours, "hour"), plural(minutes, "minute"))
        } else {
            plural(hours, "hour")
        }
    } else {
        let days = seconds / DAY;
        let hours = (seconds % DAY) / HOUR;
        if hours > 0 {
            format!("{} {}", plural(days, "day"), plural(hours, "hour"))
        } else {
            plural(days, "day")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(30));
        assert_eq!(parse_duration("5m"), Some(300));
        assert_eq!(parse_duration("1h30m"), Some(5400));
        assert_eq!(parse_duration("2d"), Some(172_800));
        assert_eq!(parse_duration("1w"), Some(604_800));
        assert_eq!(parse_duration("1H"), Some(3600));
    }

    #[test]
    fn test_parse_duration_rejects() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("5x"), None);
        assert_eq!(parse_duration("99999999999999999999w"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(300), "5 minutes");
        assert_eq!(format_duration(5400), "1 hour 30 minutes");
        assert_eq!(format_duration(7200), "2 hours");
        assert_eq!(format_duration(90_000), "1 day 1 hour");
    }
}
