pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

pub fn format_duration_digital(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// Accepts "1:30" (hours:minutes), "2h"/"1.5h" (hours), "90" (minutes), or
// "1.5" (fractional values below 10 read as hours). Anything else is 0.
pub fn parse_duration_input(input: &str) -> i64 {
    let text = input.trim();

    if let Some((hours_part, minutes_part)) = text.split_once(':') {
        let hours = hours_part.trim().parse::<i64>().unwrap_or(0);
        let minutes = minutes_part.trim().parse::<i64>().unwrap_or(0);
        return hours * 3600 + minutes * 60;
    }

    if let Some(index) = text.find(['h', 'H']) {
        let hours = text[..index].trim().parse::<f64>().unwrap_or(0.0);
        return (hours * 3600.0).round() as i64;
    }

    match text.parse::<f64>() {
        Ok(value) if value < 10.0 && value.fract() != 0.0 => (value * 3600.0).round() as i64,
        Ok(value) => (value * 60.0).round() as i64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{format_duration, format_duration_digital, parse_duration_input};

    #[test]
    fn formats_short_durations_as_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3599), "59m 59s");
    }

    #[test]
    fn formats_long_durations_as_hours_and_minutes() {
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(3659), "1h 0m");
        assert_eq!(format_duration(90000), "25h 0m");
    }

    #[test]
    fn digital_format_is_zero_padded() {
        assert_eq!(format_duration_digital(0), "00:00:00");
        assert_eq!(format_duration_digital(61), "00:01:01");
        assert_eq!(format_duration_digital(3723), "01:02:03");
        assert_eq!(format_duration_digital(360000), "100:00:00");
    }

    #[test]
    fn digital_format_round_trips() {
        for seconds in [0, 1, 59, 60, 3599, 3600, 86399, 123456] {
            let digital = format_duration_digital(seconds);
            let mut fields = digital.split(':');
            let hours = fields.next().unwrap().parse::<i64>().unwrap();
            let minutes = fields.next().unwrap().parse::<i64>().unwrap();
            let secs = fields.next().unwrap().parse::<i64>().unwrap();
            assert_eq!(hours * 3600 + minutes * 60 + secs, seconds);
        }
    }

    #[test]
    fn parses_colon_notation_as_hours_and_minutes() {
        assert_eq!(parse_duration_input("1:30"), 5400);
        assert_eq!(parse_duration_input("0:45"), 2700);
        assert_eq!(parse_duration_input("2:"), 7200);
        assert_eq!(parse_duration_input(":30"), 1800);
        assert_eq!(parse_duration_input("x:30"), 1800);
    }

    #[test]
    fn parses_hour_suffix_as_floating_hours() {
        assert_eq!(parse_duration_input("2h"), 7200);
        assert_eq!(parse_duration_input("1.5h"), 5400);
        assert_eq!(parse_duration_input("0.25H"), 900);
    }

    #[test]
    fn parses_plain_numbers_as_minutes() {
        assert_eq!(parse_duration_input("90"), 5400);
        assert_eq!(parse_duration_input("10"), 600);
        assert_eq!(parse_duration_input("10.5"), 630);
    }

    #[test]
    fn small_fractional_values_read_as_hours() {
        assert_eq!(parse_duration_input("1.5"), 5400);
        assert_eq!(parse_duration_input("9.5"), 34200);
    }

    #[test]
    fn unparseable_input_yields_zero() {
        assert_eq!(parse_duration_input("abc"), 0);
        assert_eq!(parse_duration_input(""), 0);
        assert_eq!(parse_duration_input("   "), 0);
    }
}
