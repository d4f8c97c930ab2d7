//! Date and time operators.
//!
//! Timestamps are ISO 8601 strings, read as UTC unless they carry an
//! offset. Results are rendered with the call's format argument, or the
//! `date_time_format` option when none is given.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use num_bigint::BigInt;
use strum::{Display, EnumString};

use super::locale_arg;
use crate::expression::evaluation::{apply, apply_with_options, integer_arg, verify_string};
use crate::expression::validation::{validate_order, validate_unary_string};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalError, EvalResult, EvaluationOptions, ReturnType, Value};

mod format;
pub mod ticks;

pub use format::format_datetime;

pub const DEFAULT_DATE_TIME_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fffZ";

/// Output of `convertFromUTC` when no format is given; carries no zone marker.
pub const LOCAL_DATE_TIME_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub fn parse(unit: &str) -> EvalResult<Self> {
        TimeUnit::from_str(unit)
            .map_err(|_| EvalError::invalid(format!("{} is not a valid time unit.", unit)))
    }
}

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    let s = ReturnType::STRING;
    let n = ReturnType::NUMBER;
    let formatted = [s, s];
    vec![
        add_fixed("addDays", TimeUnit::Day),
        add_fixed("addHours", TimeUnit::Hour),
        add_fixed("addMinutes", TimeUnit::Minute),
        add_fixed("addSeconds", TimeUnit::Second),
        shift("addToTime", 1),
        shift("subtractFromTime", -1),
        relative_to_now("getFutureTime", 1),
        relative_to_now("getPastTime", -1),
        start_of("startOfDay", |dt| dt.date_naive().and_hms_opt(0, 0, 0)),
        start_of("startOfHour", |dt| dt.date_naive().and_hms_opt(dt.hour(), 0, 0)),
        start_of("startOfMonth", |dt| {
            dt.date_naive().with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }),
        component("dayOfMonth", |dt| dt.day() as i64),
        component("dayOfWeek", |dt| dt.weekday().num_days_from_sunday() as i64),
        component("dayOfYear", |dt| dt.ordinal() as i64),
        component("month", |dt| dt.month() as i64),
        component("year", |dt| dt.year() as i64),
        OperatorDefinition::new(
            "date",
            s,
            apply(
                |args| {
                    let dt = timestamp_arg(args, 0)?;
                    Ok(Value::String(format_datetime(&dt.fixed_offset(), "M/dd/yyyy")?))
                },
                Some(verify_string),
            ),
            validate_unary_string,
        ),
        OperatorDefinition::new(
            "utcNow",
            s,
            apply_with_options(|args, options| render(Utc::now(), args, 0, options), None),
            move |e: &Expression| validate_order(e, &formatted, &[]),
        ),
        OperatorDefinition::new(
            "formatDateTime",
            s,
            apply_with_options(
                |args, options| render(timestamp_arg(args, 0)?, args, 1, options),
                None,
            ),
            move |e: &Expression| validate_order(e, &formatted, &[s]),
        ),
        OperatorDefinition::new(
            "formatEpoch",
            s,
            apply_with_options(
                |args, options| {
                    let epoch = args[0].as_f64().ok_or_else(|| {
                        EvalError::invalid(format!("{} is not a number.", args[0]))
                    })?;
                    let seconds = epoch.floor();
                    let nanos = ((epoch - seconds) * 1e9).round() as u32;
                    let dt = DateTime::from_timestamp(seconds as i64, nanos.min(999_999_999))
                        .ok_or_else(|| {
                            EvalError::invalid(format!(
                                "{} is out of the supported datetime range.",
                                epoch
                            ))
                        })?;
                    render(dt, args, 1, options)
                },
                None,
            ),
            move |e: &Expression| validate_order(e, &formatted, &[n]),
        ),
        OperatorDefinition::new(
            "formatTicks",
            s,
            apply_with_options(
                |args, options| {
                    let ticks = big_ticks_arg(args, 0)?;
                    render(ticks::from_ticks(&ticks)?, args, 1, options)
                },
                None,
            ),
            move |e: &Expression| validate_order(e, &formatted, &[n | s]),
        ),
        OperatorDefinition::new(
            "ticks",
            n,
            apply(
                |args| {
                    let dt = timestamp_arg(args, 0)?;
                    Ok(Value::Integer(ticks::narrow(ticks::to_ticks(&dt))?))
                },
                Some(verify_string),
            ),
            validate_unary_string,
        ),
        ticks_to("ticksToDays", ticks::TICKS_PER_DAY),
        ticks_to("ticksToHours", ticks::TICKS_PER_HOUR),
        ticks_to("ticksToMinutes", ticks::TICKS_PER_MINUTE),
        OperatorDefinition::new(
            "dateTimeDiff",
            n,
            apply(
                |args| {
                    let a = ticks::to_ticks(&timestamp_arg(args, 0)?);
                    let b = ticks::to_ticks(&timestamp_arg(args, 1)?);
                    Ok(Value::Integer(ticks::narrow(a - b)?))
                },
                Some(verify_string),
            ),
            move |e: &Expression| validate_order(e, &[], &[s, s]),
        ),
        OperatorDefinition::new(
            "getTimeOfDay",
            s,
            apply(
                |args| Ok(Value::from(time_of_day(&timestamp_arg(args, 0)?))),
                Some(verify_string),
            ),
            validate_unary_string,
        ),
        OperatorDefinition::new(
            "convertFromUTC",
            s,
            apply_with_options(convert_from_utc, None),
            move |e: &Expression| validate_order(e, &formatted, &[s, s]),
        ),
        OperatorDefinition::new(
            "convertToUTC",
            s,
            apply_with_options(convert_to_utc, None),
            move |e: &Expression| validate_order(e, &formatted, &[s, s]),
        ),
    ]
}

/// Parse an ISO 8601 timestamp, normalized to UTC.
pub fn parse_timestamp(s: &str) -> EvalResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive(s).map(|naive| naive.and_utc()))
        .ok_or_else(|| EvalError::parse(format!("{} is not a valid datetime string.", s)))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn timestamp_arg(args: &[Value], index: usize) -> EvalResult<DateTime<Utc>> {
    match args.get(index) {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(other) => Err(EvalError::invalid(format!(
            "{} is not a valid datetime string.",
            other
        ))),
        None => Err(EvalError::invalid("missing timestamp argument.")),
    }
}

/// Ticks as an integer or a string of decimal digits.
fn big_ticks_arg(args: &[Value], index: usize) -> EvalResult<BigInt> {
    match args.get(index) {
        Some(Value::String(s)) => s.trim().parse::<BigInt>().map_err(|_| {
            EvalError::invalid(format!("{} should contain an integer of ticks", s))
        }),
        _ => ticks_arg(args, index).map(BigInt::from),
    }
}

fn ticks_arg(args: &[Value], index: usize) -> EvalResult<i64> {
    args.get(index)
        .and_then(Value::as_integer)
        .ok_or_else(|| {
            EvalError::invalid(format!(
                "{} should contain an integer of ticks",
                args.get(index).cloned().unwrap_or_default()
            ))
        })
}

fn format_arg<'a>(args: &'a [Value], index: usize, default: &'a str) -> EvalResult<&'a str> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(format)) => Ok(format),
        Some(other) => Err(EvalError::invalid(format!("{} is not a string.", other))),
    }
}

/// Render with the format at `format_index`; a locale may follow it.
fn render<T: TimeZone>(
    dt: DateTime<T>,
    args: &[Value],
    format_index: usize,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let format = format_arg(args, format_index, &options.date_time_format)?;
    locale_arg(args, format_index + 1, options)?;
    Ok(Value::String(format_datetime(&dt.fixed_offset(), format)?))
}

fn out_of_range() -> EvalError {
    EvalError::invalid("the resulting datetime is out of range.")
}

fn directed(amount: i64, direction: i64) -> EvalResult<i64> {
    amount.checked_mul(direction).ok_or_else(out_of_range)
}

pub fn add_to_time(dt: DateTime<Utc>, amount: i64, unit: TimeUnit) -> EvalResult<DateTime<Utc>> {
    let delta = match unit {
        TimeUnit::Second => Duration::try_seconds(amount),
        TimeUnit::Minute => Duration::try_minutes(amount),
        TimeUnit::Hour => Duration::try_hours(amount),
        TimeUnit::Day => Duration::try_days(amount),
        TimeUnit::Week => Duration::try_weeks(amount),
        TimeUnit::Month | TimeUnit::Year => {
            let months = match unit {
                TimeUnit::Year => amount.checked_mul(12).ok_or_else(out_of_range)?,
                _ => amount,
            };
            let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
            let shifted = if months >= 0 {
                dt.checked_add_months(Months::new(magnitude))
            } else {
                dt.checked_sub_months(Months::new(magnitude))
            };
            return shifted.ok_or_else(out_of_range);
        }
    };
    delta
        .and_then(|delta| dt.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

/// `name(timestamp, count[, format[, locale]])`.
fn add_fixed(name: &'static str, unit: TimeUnit) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::STRING,
        apply_with_options(
            move |args, options| {
                let dt = timestamp_arg(args, 0)?;
                let amount = integer_arg(args, 1, &args[1].to_string())?;
                render(add_to_time(dt, amount, unit)?, args, 2, options)
            },
            None,
        ),
        |e: &Expression| {
            validate_order(
                e,
                &[ReturnType::STRING, ReturnType::STRING],
                &[ReturnType::STRING, ReturnType::NUMBER],
            )
        },
    )
}

/// `name(timestamp, interval, unit[, format[, locale]])`.
fn shift(name: &'static str, direction: i64) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::STRING,
        apply_with_options(
            move |args, options| {
                let dt = timestamp_arg(args, 0)?;
                let amount = integer_arg(args, 1, &args[1].to_string())?;
                let unit = TimeUnit::parse(&args[2].to_string())?;
                let amount = directed(amount, direction)?;
                render(add_to_time(dt, amount, unit)?, args, 3, options)
            },
            None,
        ),
        |e: &Expression| {
            validate_order(
                e,
                &[ReturnType::STRING, ReturnType::STRING],
                &[ReturnType::STRING, ReturnType::NUMBER, ReturnType::STRING],
            )
        },
    )
}

/// `name(interval, unit[, format[, locale]])`, relative to the current time.
fn relative_to_now(name: &'static str, direction: i64) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::STRING,
        apply_with_options(
            move |args, options| {
                let amount = integer_arg(args, 0, &args[0].to_string())?;
                let unit = TimeUnit::parse(&args[1].to_string())?;
                let amount = directed(amount, direction)?;
                render(add_to_time(Utc::now(), amount, unit)?, args, 2, options)
            },
            None,
        ),
        |e: &Expression| {
            validate_order(
                e,
                &[ReturnType::STRING, ReturnType::STRING],
                &[ReturnType::NUMBER, ReturnType::STRING],
            )
        },
    )
}

/// `name(timestamp[, format[, locale]])`, truncating the timestamp.
fn start_of(
    name: &'static str,
    truncate: fn(&DateTime<Utc>) -> Option<NaiveDateTime>,
) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::STRING,
        apply_with_options(
            move |args, options| {
                let dt = timestamp_arg(args, 0)?;
                let start = truncate(&dt)
                    .ok_or_else(|| EvalError::invalid(format!("cannot truncate {}.", args[0])))?;
                render(start.and_utc(), args, 1, options)
            },
            None,
        ),
        |e: &Expression| {
            validate_order(
                e,
                &[ReturnType::STRING, ReturnType::STRING],
                &[ReturnType::STRING],
            )
        },
    )
}

fn component(name: &'static str, extract: fn(&DateTime<Utc>) -> i64) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::NUMBER,
        apply(
            move |args| Ok(Value::Integer(extract(&timestamp_arg(args, 0)?))),
            Some(verify_string),
        ),
        validate_unary_string,
    )
}

fn ticks_to(name: &'static str, unit: i64) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::NUMBER,
        apply(
            move |args| Ok(Value::Float(ticks::scale(ticks_arg(args, 0)?, unit))),
            None,
        ),
        |e: &Expression| validate_order(e, &[], &[ReturnType::NUMBER]),
    )
}

fn time_of_day(dt: &DateTime<Utc>) -> &'static str {
    match dt.hour() * 100 + dt.minute() {
        0 => "midnight",
        t if t < 1200 => "morning",
        1200 => "noon",
        t if t < 1800 => "afternoon",
        t if t <= 2200 => "evening",
        _ => "night",
    }
}

fn timezone_arg(args: &[Value], index: usize) -> EvalResult<Tz> {
    let name = args.get(index).and_then(Value::as_str).unwrap_or_default();
    name.parse::<Tz>()
        .map_err(|_| EvalError::invalid(format!("{} is not a valid timezone.", name)))
}

fn convert_from_utc(args: &[Value], options: &EvaluationOptions) -> EvalResult<Value> {
    let dt = timestamp_arg(args, 0)?;
    let zone = timezone_arg(args, 1)?;
    let format = format_arg(args, 2, LOCAL_DATE_TIME_FORMAT)?;
    locale_arg(args, 3, options)?;
    let local: DateTime<FixedOffset> = dt.with_timezone(&zone).fixed_offset();
    Ok(Value::String(format_datetime(&local, format)?))
}

fn convert_to_utc(args: &[Value], options: &EvaluationOptions) -> EvalResult<Value> {
    let Some(Value::String(text)) = args.first() else {
        return Err(EvalError::invalid(format!(
            "{} is not a valid datetime string.",
            args.first().cloned().unwrap_or_default()
        )));
    };
    let zone = timezone_arg(args, 1)?;
    // The wall-clock reading is interpreted in the source zone; any
    // offset in the text is ignored.
    let naive = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| parse_naive(text))
        .ok_or_else(|| EvalError::parse(format!("{} is not a valid datetime string.", text)))?;
    let local = zone.from_local_datetime(&naive).earliest().ok_or_else(|| {
        EvalError::invalid(format!("{} does not exist in timezone {}.", text, zone))
    })?;
    render(local.with_timezone(&Utc), args, 2, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;
    use crate::FunctionRegistry;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let children = args.into_iter().map(Expression::constant).collect();
        FunctionRegistry::standard()
            .make_expression(name, children)
            .unwrap()
            .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
    }

    fn text(name: &str, args: Vec<Value>) -> String {
        call(name, args).unwrap().to_string()
    }

    const TS: &str = "2018-03-15T13:00:00.000Z";

    #[test]
    fn test_time_unit_parse() {
        assert_eq!(TimeUnit::parse("day").unwrap(), TimeUnit::Day);
        assert_eq!(TimeUnit::parse("MONTH").unwrap(), TimeUnit::Month);
        assert_eq!(
            TimeUnit::parse("fortnight").unwrap_err().message(),
            "fortnight is not a valid time unit."
        );
    }

    #[test]
    fn test_add_functions() {
        assert_eq!(text("addDays", vec![TS.into(), 1.into()]), "2018-03-16T13:00:00.000Z");
        assert_eq!(text("addHours", vec![TS.into(), (-2).into()]), "2018-03-15T11:00:00.000Z");
        assert_eq!(
            text("addMinutes", vec![TS.into(), 30.into(), "HH:mm".into()]),
            "13:30"
        );
        assert_eq!(text("addSeconds", vec![TS.into(), 5.into()]), "2018-03-15T13:00:05.000Z");
        assert_eq!(
            text("addToTime", vec!["2018-01-31T00:00:00Z".into(), 1.into(), "Month".into()]),
            "2018-02-28T00:00:00.000Z"
        );
        assert_eq!(
            text("subtractFromTime", vec![TS.into(), 1.into(), "Year".into()]),
            "2017-03-15T13:00:00.000Z"
        );
        assert_eq!(
            call("addToTime", vec![TS.into(), 1.into(), "eon".into()]).unwrap_err().message(),
            "eon is not a valid time unit."
        );
    }

    #[test]
    fn test_negated_interval_overflow_is_an_error() {
        let err = call(
            "subtractFromTime",
            vec![TS.into(), Value::Integer(i64::MIN), "second".into()],
        )
        .unwrap_err();
        assert_eq!(err.message(), "the resulting datetime is out of range.");
        let err = call("getPastTime", vec![Value::Integer(i64::MIN), "day".into()]).unwrap_err();
        assert_eq!(err.message(), "the resulting datetime is out of range.");
        assert!(call("getFutureTime", vec![Value::Integer(i64::MAX), "year".into()]).is_err());
    }

    #[test]
    fn test_start_of() {
        let at = || vec![Value::from("2018-03-15T13:30:30.000Z")];
        assert_eq!(text("startOfDay", at()), "2018-03-15T00:00:00.000Z");
        assert_eq!(text("startOfHour", at()), "2018-03-15T13:00:00.000Z");
        assert_eq!(text("startOfMonth", at()), "2018-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_components() {
        assert_eq!(call("dayOfMonth", vec![TS.into()]).unwrap(), Value::Integer(15));
        assert_eq!(call("dayOfWeek", vec![TS.into()]).unwrap(), Value::Integer(4));
        assert_eq!(call("dayOfYear", vec![TS.into()]).unwrap(), Value::Integer(74));
        assert_eq!(call("month", vec![TS.into()]).unwrap(), Value::Integer(3));
        assert_eq!(call("year", vec![TS.into()]).unwrap(), Value::Integer(2018));
        assert_eq!(text("date", vec![TS.into()]), "3/15/2018");
        assert_eq!(
            call("year", vec!["not a date".into()]).unwrap_err().message(),
            "not a date is not a valid datetime string."
        );
    }

    #[test]
    fn test_formatting() {
        assert_eq!(text("formatDateTime", vec!["2018-03-15".into()]), "2018-03-15T00:00:00.000Z");
        assert_eq!(
            text("formatDateTime", vec![TS.into(), "dd/MM/yyyy".into(), "fr-FR".into()]),
            "15/03/2018"
        );
        assert_eq!(text("formatEpoch", vec![1521118800.into()]), TS);
        assert_eq!(text("formatTicks", vec![636_566_868_000_000_000i64.into()]), TS);
        assert_eq!(text("formatTicks", vec!["636566868000000000".into()]), TS);
        assert_eq!(
            call("formatTicks", vec!["soon".into()]).unwrap_err().message(),
            "soon should contain an integer of ticks"
        );
        assert!(text("utcNow", vec![]).ends_with('Z'));
    }

    #[test]
    fn test_ticks() {
        assert_eq!(
            call("ticks", vec![TS.into()]).unwrap(),
            Value::Integer(636_566_868_000_000_000)
        );
        assert_eq!(
            call("ticksToDays", vec![ticks::TICKS_PER_DAY.into()]).unwrap(),
            Value::Float(1.0)
        );
        assert_eq!(
            call("ticksToHours", vec![(ticks::TICKS_PER_HOUR * 36).into()]).unwrap(),
            Value::Float(36.0)
        );
        assert_eq!(
            call("ticksToMinutes", vec![(ticks::TICKS_PER_MINUTE * 90).into()]).unwrap(),
            Value::Float(90.0)
        );
        assert_eq!(
            call(
                "dateTimeDiff",
                vec!["2019-01-01T08:00:00.000Z".into(), "2018-01-01T08:00:00.000Z".into()]
            )
            .unwrap(),
            Value::Integer(365 * ticks::TICKS_PER_DAY)
        );
        assert_eq!(
            call("ticksToDays", vec![1.5.into()]).unwrap_err().message(),
            "1.5 should contain an integer of ticks"
        );
    }

    #[test]
    fn test_time_of_day() {
        let cases = [
            ("2018-03-15T00:00:00Z", "midnight"),
            ("2018-03-15T08:00:00Z", "morning"),
            ("2018-03-15T12:00:00Z", "noon"),
            ("2018-03-15T13:00:00Z", "afternoon"),
            ("2018-03-15T18:00:00Z", "evening"),
            ("2018-03-15T22:00:00Z", "evening"),
            ("2018-03-15T22:30:00Z", "night"),
        ];
        for (ts, expected) in cases {
            assert_eq!(text("getTimeOfDay", vec![ts.into()]), expected, "{}", ts);
        }
    }

    #[test]
    fn test_timezone_conversion() {
        let local = text("convertFromUTC", vec![TS.into(), "America/New_York".into()]);
        assert_eq!(local, "2018-03-15T09:00:00.000");
        assert_eq!(text("convertToUTC", vec![local.into(), "America/New_York".into()]), TS);
        assert!(call("convertFromUTC", vec![TS.into(), "Mars/Olympus".into()]).is_err());
    }
}
