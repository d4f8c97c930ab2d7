//! .NET-style date/time format patterns.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::{EvalError, EvalResult};

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// Expansion of a single-letter standard format name.
fn standard_pattern(name: char) -> Option<&'static str> {
    Some(match name {
        'o' | 'O' => "yyyy-MM-ddTHH:mm:ss.fffffffK",
        's' => "yyyy-MM-ddTHH:mm:ss",
        'u' => "yyyy-MM-dd HH:mm:ss'Z'",
        'd' => "M/d/yyyy",
        'D' => "dddd, MMMM d, yyyy",
        't' => "h:mm tt",
        'T' => "h:mm:ss tt",
        'g' => "M/d/yyyy h:mm tt",
        'G' => "M/d/yyyy h:mm:ss tt",
        'f' => "dddd, MMMM d, yyyy h:mm tt",
        'F' => "dddd, MMMM d, yyyy h:mm:ss tt",
        'r' | 'R' => "ddd, dd MMM yyyy HH:mm:ss 'GMT'",
        'M' | 'm' => "MMMM d",
        'Y' | 'y' => "MMMM yyyy",
        _ => return None,
    })
}

fn offset_parts(dt: &DateTime<FixedOffset>) -> (char, i32, i32) {
    let seconds = dt.offset().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    (sign, minutes / 60, minutes % 60)
}

fn fraction(dt: &DateTime<FixedOffset>, digits: usize) -> String {
    let nanos = dt.nanosecond() % 1_000_000_000;
    format!("{:09}", nanos)[..digits].to_string()
}

/// Render `dt` with a custom pattern (`yyyy-MM-dd HH:mm`) or a standard
/// single-letter format name (`o`, `D`, `t`, ...).
pub fn format_datetime(dt: &DateTime<FixedOffset>, pattern: &str) -> EvalResult<String> {
    let invalid = || EvalError::invalid(format!("{} is not a valid datetime format.", pattern));
    let mut chars = pattern.chars();
    let pattern = match (chars.next(), chars.next()) {
        (Some(name), None) => standard_pattern(name).ok_or_else(invalid)?,
        _ => pattern,
    };

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|x| **x == c).count();
        match c {
            'y' => {
                let year = dt.year();
                match run {
                    1 => out.push_str(&(year % 100).to_string()),
                    2 => out.push_str(&format!("{:02}", year % 100)),
                    n => out.push_str(&format!("{:0width$}", year, width = n)),
                }
            }
            'M' => match run {
                1 => out.push_str(&dt.month().to_string()),
                2 => out.push_str(&format!("{:02}", dt.month())),
                3 => out.push_str(&MONTHS[dt.month0() as usize][..3]),
                _ => out.push_str(MONTHS[dt.month0() as usize]),
            },
            'd' => {
                let weekday = WEEKDAYS[dt.weekday().num_days_from_sunday() as usize];
                match run {
                    1 => out.push_str(&dt.day().to_string()),
                    2 => out.push_str(&format!("{:02}", dt.day())),
                    3 => out.push_str(&weekday[..3]),
                    _ => out.push_str(weekday),
                }
            }
            'H' | 'h' | 'm' | 's' => {
                let value = match c {
                    'H' => dt.hour(),
                    'h' => match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    },
                    'm' => dt.minute(),
                    _ => dt.second(),
                };
                if run == 1 {
                    out.push_str(&value.to_string());
                } else {
                    out.push_str(&format!("{:02}", value));
                }
            }
            'f' | 'F' => {
                if run > 7 {
                    return Err(invalid());
                }
                let digits = fraction(dt, run);
                if c == 'f' {
                    out.push_str(&digits);
                } else {
                    let trimmed = digits.trim_end_matches('0');
                    if trimmed.is_empty() && out.ends_with('.') {
                        out.pop();
                    }
                    out.push_str(trimmed);
                }
            }
            't' => {
                let am_pm = if dt.hour() < 12 { "AM" } else { "PM" };
                out.push_str(if run == 1 { &am_pm[..1] } else { am_pm });
            }
            'K' => {
                let (sign, h, m) = offset_parts(dt);
                if dt.offset().local_minus_utc() == 0 {
                    out.push('Z');
                } else {
                    out.push_str(&format!("{}{:02}:{:02}", sign, h, m));
                }
            }
            'z' => {
                let (sign, h, m) = offset_parts(dt);
                match run {
                    1 => out.push_str(&format!("{}{}", sign, h)),
                    2 => out.push_str(&format!("{}{:02}", sign, h)),
                    _ => out.push_str(&format!("{}{:02}:{:02}", sign, h, m)),
                }
            }
            'g' => out.push_str("A.D."),
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|x| *x == c)
                    .ok_or_else(invalid)?;
                out.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(invalid)?;
                out.push(*escaped);
                i += 2;
                continue;
            }
            '%' => {
                i += 1;
                continue;
            }
            other => {
                out.push(other);
                i += 1;
                continue;
            }
        }
        i += run;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2018, 3, 5, 13, 4, 9)
            .unwrap()
            + chrono::Duration::milliseconds(120)
    }

    #[test]
    fn test_custom_patterns() {
        let dt = sample();
        assert_eq!(
            format_datetime(&dt, "yyyy-MM-ddTHH:mm:ss.fffZ").unwrap(),
            "2018-03-05T13:04:09.120Z"
        );
        assert_eq!(format_datetime(&dt, "M/d/yy h:m tt").unwrap(), "3/5/18 1:4 PM");
        assert_eq!(format_datetime(&dt, "dddd, MMM dd").unwrap(), "Monday, Mar 05");
        assert_eq!(format_datetime(&dt, "ss.FFF").unwrap(), "09.12");
        assert_eq!(format_datetime(&dt, "'at' HH\\h").unwrap(), "at 13h");
    }

    #[test]
    fn test_standard_names() {
        let dt = sample();
        assert_eq!(format_datetime(&dt, "o").unwrap(), "2018-03-05T13:04:09.1200000Z");
        assert_eq!(format_datetime(&dt, "D").unwrap(), "Monday, March 5, 2018");
        assert_eq!(format_datetime(&dt, "t").unwrap(), "1:04 PM");
        assert_eq!(format_datetime(&dt, "r").unwrap(), "Mon, 05 Mar 2018 13:04:09 GMT");
        assert!(format_datetime(&dt, "Q").is_err());
    }

    #[test]
    fn test_offset_tokens() {
        let dt = FixedOffset::west_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
            .unwrap();
        assert_eq!(format_datetime(&dt, "HH:mmK").unwrap(), "00:00-05:30");
        assert_eq!(format_datetime(&dt, "zz").unwrap(), "-05");
    }
}
