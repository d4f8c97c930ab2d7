//! TIMEX classification: `isDefinite`, `isTime`, `isDuration`, `isDate`,
//! `isTimeRange`, `isDateRange` and `isPresent`, plus the `dateReadBack`
//! English rendering of a date.

use chrono::{Datelike, Days, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use super::datetime::parse_timestamp;
use crate::expression::evaluation::{apply, verify_string};
use crate::expression::validation::{validate_arity_and_any_type, validate_binary_string};
use crate::expression::{Expression, OperatorDefinition};
use crate::value::ObjectRef;
use crate::{EvalError, EvalResult, ReturnType, Value};

lazy_static! {
    static ref DURATION: Regex = Regex::new(
        r"^P(?:(\d+(?:\.\d+)?)Y)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)W)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$"
    )
    .unwrap();
    static ref FULL_DATE: Regex = Regex::new(r"^(\d{4}|XXXX)-(\d{2}|XX)-(\d{2}|XX)$").unwrap();
    static ref DAY_OF_WEEK: Regex = Regex::new(r"^(\d{4}|XXXX)-W(\d{2}|XX)-([1-7])$").unwrap();
    static ref WEEK_OF_YEAR: Regex = Regex::new(r"^(\d{4}|XXXX)-W(\d{2})(-WE)?$").unwrap();
    static ref WEEK_OF_MONTH: Regex = Regex::new(r"^(\d{4}|XXXX)-(\d{2})-W(\d{2})(-WE)?$").unwrap();
    static ref SEASON: Regex = Regex::new(r"^(\d{4}|XXXX)-(SP|SU|FA|WI)$").unwrap();
    static ref YEAR_MONTH: Regex = Regex::new(r"^(\d{4}|XXXX)-(\d{2})$").unwrap();
    static ref YEAR: Regex = Regex::new(r"^(\d{4})$").unwrap();
    static ref TIME: Regex = Regex::new(r"^(\d{2})(?::(\d{2}))?(?::(\d{2}))?$").unwrap();
    static ref PART_OF_DAY: Regex = Regex::new(r"^(MO|MI|AF|EV|NI|PM|DT)$").unwrap();
}

const PRESENT: &str = "PRESENT_REF";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Decomposed TIMEX fields. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimexProperty {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day_of_month: Option<i64>,
    pub day_of_week: Option<i64>,
    pub week_of_year: Option<i64>,
    pub week_of_month: Option<i64>,
    pub weekend: Option<bool>,
    pub season: Option<String>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub part_of_day: Option<String>,
    pub years: Option<f64>,
    pub months: Option<f64>,
    pub weeks: Option<f64>,
    pub days: Option<f64>,
    pub hours: Option<f64>,
    pub minutes: Option<f64>,
    pub seconds: Option<f64>,
    pub now: Option<bool>,
}

impl TimexProperty {
    /// Parse a TIMEX string. Ranges such as `(2017-10-12,2017-10-15,P3D)`
    /// take their date/time fields from the start and the duration from the
    /// third component.
    pub fn parse(timex: &str) -> EvalResult<Self> {
        let invalid = || EvalError::parse(format!("{} is not a valid timex string.", timex));
        let text = timex.trim();
        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            let [start, _end, duration] = parts.as_slice() else {
                return Err(invalid());
            };
            let mut property = Self::parse_single(start).ok_or_else(invalid)?;
            let duration = Self::parse_single(duration)
                .filter(|d| d.has_duration())
                .ok_or_else(invalid)?;
            property.merge_duration(&duration);
            return Ok(property);
        }
        Self::parse_single(text).ok_or_else(invalid)
    }

    fn parse_single(text: &str) -> Option<Self> {
        let mut property = Self::default();
        if text == PRESENT {
            property.now = Some(true);
            return Some(property);
        }
        if text.starts_with('P') {
            return property.parse_duration(text).then_some(property);
        }
        let (date, time) = match text.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (text, None),
        };
        if date.is_empty() && time.is_none() {
            return None;
        }
        if !date.is_empty() && !property.parse_date(date) {
            return None;
        }
        if let Some(time) = time {
            if !property.parse_time(time) {
                return None;
            }
        }
        Some(property)
    }

    fn parse_duration(&mut self, text: &str) -> bool {
        let Some(caps) = DURATION.captures(text) else {
            return false;
        };
        let unit = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
        self.years = unit(1);
        self.months = unit(2);
        self.weeks = unit(3);
        self.days = unit(4);
        self.hours = unit(5);
        self.minutes = unit(6);
        self.seconds = unit(7);
        self.has_duration()
    }

    fn parse_date(&mut self, text: &str) -> bool {
        if let Some(caps) = FULL_DATE.captures(text) {
            self.year = number(caps.get(1));
            self.month = number(caps.get(2));
            self.day_of_month = number(caps.get(3));
        } else if let Some(caps) = DAY_OF_WEEK.captures(text) {
            self.year = number(caps.get(1));
            self.week_of_year = number(caps.get(2));
            self.day_of_week = number(caps.get(3));
        } else if let Some(caps) = WEEK_OF_YEAR.captures(text) {
            self.year = number(caps.get(1));
            self.week_of_year = number(caps.get(2));
            self.weekend = caps.get(3).map(|_| true);
        } else if let Some(caps) = WEEK_OF_MONTH.captures(text) {
            self.year = number(caps.get(1));
            self.month = number(caps.get(2));
            self.week_of_month = number(caps.get(3));
            self.weekend = caps.get(4).map(|_| true);
        } else if let Some(caps) = SEASON.captures(text) {
            self.year = number(caps.get(1));
            self.season = caps.get(2).map(|m| m.as_str().to_string());
        } else if let Some(caps) = YEAR_MONTH.captures(text) {
            self.year = number(caps.get(1));
            self.month = number(caps.get(2));
        } else if let Some(caps) = YEAR.captures(text) {
            self.year = number(caps.get(1));
        } else {
            return false;
        }
        true
    }

    fn parse_time(&mut self, text: &str) -> bool {
        if PART_OF_DAY.is_match(text) {
            self.part_of_day = Some(text.to_string());
            return true;
        }
        let Some(caps) = TIME.captures(text) else {
            return false;
        };
        // A bare hour is a whole hour.
        self.hour = number(caps.get(1));
        self.minute = number(caps.get(2)).or(Some(0));
        self.second = number(caps.get(3)).or(Some(0));
        true
    }

    fn merge_duration(&mut self, other: &Self) {
        self.years = other.years;
        self.months = other.months;
        self.weeks = other.weeks;
        self.days = other.days;
        self.hours = other.hours;
        self.minutes = other.minutes;
        self.seconds = other.seconds;
    }

    /// Read TIMEX fields from an object. A `timex` string property takes
    /// precedence over the individual fields.
    pub fn from_object(object: &ObjectRef) -> EvalResult<Self> {
        if let Some(Value::String(timex)) = object.get("timex") {
            return Self::parse(&timex);
        }
        let int = |key: &str| object.get(key).and_then(|v| v.as_integer());
        let float = |key: &str| object.get(key).and_then(|v| v.as_f64());
        let text = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_str().map(str::to_string))
        };
        let flag = |key: &str| match object.get(key) {
            Some(Value::Boolean(b)) => Some(b),
            _ => None,
        };
        Ok(Self {
            year: int("year"),
            month: int("month"),
            day_of_month: int("dayOfMonth"),
            day_of_week: int("dayOfWeek"),
            week_of_year: int("weekOfYear"),
            week_of_month: int("weekOfMonth"),
            weekend: flag("weekend"),
            season: text("season"),
            hour: int("hour"),
            minute: int("minute"),
            second: int("second"),
            part_of_day: text("partOfDay"),
            years: float("years"),
            months: float("months"),
            weeks: float("weeks"),
            days: float("days"),
            hours: float("hours"),
            minutes: float("minutes"),
            seconds: float("seconds"),
            now: flag("now"),
        })
    }

    fn has_duration(&self) -> bool {
        [
            self.years,
            self.months,
            self.weeks,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
        ]
        .iter()
        .any(Option::is_some)
    }

    pub fn is_definite(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.day_of_month.is_some()
    }

    pub fn is_time(&self) -> bool {
        self.hour.is_some() && self.minute.is_some() && self.second.is_some()
    }

    pub fn is_duration(&self) -> bool {
        self.has_duration()
    }

    pub fn is_date(&self) -> bool {
        (self.month.is_some() && self.day_of_month.is_some()) || self.day_of_week.is_some()
    }

    pub fn is_time_range(&self) -> bool {
        self.part_of_day.is_some()
    }

    pub fn is_date_range(&self) -> bool {
        (self.year.is_some() && self.day_of_month.is_none())
            || (self.month.is_some() && self.day_of_month.is_none())
            || self.season.is_some()
            || self.week_of_year.is_some()
            || self.week_of_month.is_some()
    }

    pub fn is_present(&self) -> bool {
        self.now == Some(true)
    }

    /// The date fields of a calendar day.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: Some(i64::from(date.year())),
            month: Some(i64::from(date.month())),
            day_of_month: Some(i64::from(date.day())),
            ..Self::default()
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::try_from(self.year?).ok()?,
            u32::try_from(self.month?).ok()?,
            u32::try_from(self.day_of_month?).ok()?,
        )
    }

    /// English rendering of the date part, relative to `reference` when the
    /// date is definite. `None` when there is no date to render.
    pub fn to_natural_language(&self, reference: NaiveDate) -> Option<String> {
        if let Some(date) = self.date() {
            match date.signed_duration_since(reference).num_days() {
                0 => return Some("today".to_string()),
                1 => return Some("tomorrow".to_string()),
                -1 => return Some("yesterday".to_string()),
                _ => {}
            }
            let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
            let weeks = week_start(date)?
                .signed_duration_since(week_start(reference)?)
                .num_days()
                / 7;
            return Some(match weeks {
                0 => format!("this {}", weekday),
                1 => format!("next {}", weekday),
                -1 => format!("last {}", weekday),
                _ => format!(
                    "{} {} {}",
                    ordinal(date.day()),
                    MONTHS[date.month0() as usize],
                    date.year()
                ),
            });
        }
        if let Some(day) = self.day_of_week {
            let index = usize::try_from(day.checked_sub(1)?).ok()?;
            return WEEKDAYS.get(index).map(|name| name.to_string());
        }
        let month = MONTHS.get(usize::try_from(self.month?.checked_sub(1)?).ok()?)?;
        let day = u32::try_from(self.day_of_month?).ok()?;
        Some(format!("{} {}", ordinal(day), month))
    }
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

fn date_read_back(args: &[Value]) -> EvalResult<Value> {
    let reference = parse_timestamp(&args[0].to_string())?.date_naive();
    let target = parse_timestamp(&args[1].to_string())?.date_naive();
    TimexProperty::from_date(target)
        .to_natural_language(reference)
        .map(Value::String)
        .ok_or_else(|| EvalError::invalid(format!("{} cannot be read back.", args[1])))
}

fn number(m: Option<regex::Match<'_>>) -> Option<i64> {
    m.and_then(|m| m.as_str().parse().ok())
}

fn timex_arg(value: &Value) -> EvalResult<TimexProperty> {
    match value {
        Value::String(timex) => TimexProperty::parse(timex),
        Value::Object(object) => TimexProperty::from_object(object),
        other => Err(EvalError::invalid(format!(
            "{} requires a TimexProperty or a string as an argument",
            other
        ))),
    }
}

fn predicate(name: &'static str, test: fn(&TimexProperty) -> bool) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::BOOLEAN,
        apply(move |args| Ok(Value::Boolean(test(&timex_arg(&args[0])?))), None),
        |e: &Expression| validate_arity_and_any_type(e, 1, 1, ReturnType::STRING),
    )
}

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        predicate("isDefinite", TimexProperty::is_definite),
        predicate("isTime", TimexProperty::is_time),
        predicate("isDuration", TimexProperty::is_duration),
        predicate("isDate", TimexProperty::is_date),
        predicate("isTimeRange", TimexProperty::is_time_range),
        predicate("isDateRange", TimexProperty::is_date_range),
        predicate("isPresent", TimexProperty::is_present),
        OperatorDefinition::new(
            "dateReadBack",
            ReturnType::STRING,
            apply(date_read_back, Some(verify_string)),
            validate_binary_string,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;
    use crate::{EvaluationOptions, FunctionRegistry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn check(name: &str, timex: &str) -> bool {
        let expr = FunctionRegistry::standard()
            .make_expression(name, vec![Expression::constant(timex)])
            .unwrap();
        match expr
            .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
            .unwrap()
        {
            Value::Boolean(b) => b,
            other => panic!("expected boolean, got {}", other),
        }
    }

    #[test]
    fn test_parse_fields() {
        let property = TimexProperty::parse("2017-10-12T12:30").unwrap();
        assert_eq!(property.year, Some(2017));
        assert_eq!(property.month, Some(10));
        assert_eq!(property.day_of_month, Some(12));
        assert_eq!(property.hour, Some(12));
        assert_eq!(property.minute, Some(30));
        assert_eq!(property.second, Some(0));

        let property = TimexProperty::parse("XXXX-WXX-3").unwrap();
        assert_eq!(property.year, None);
        assert_eq!(property.day_of_week, Some(3));

        let property = TimexProperty::parse("P1Y2MT30M").unwrap();
        assert_eq!(property.years, Some(1.0));
        assert_eq!(property.months, Some(2.0));
        assert_eq!(property.minutes, Some(30.0));
    }

    #[test]
    fn test_predicates() {
        assert!(check("isDefinite", "2017-10-12"));
        assert!(!check("isDefinite", "XXXX-10-12"));
        assert!(check("isDate", "XXXX-10-12"));
        assert!(check("isDate", "XXXX-WXX-1"));
        assert!(check("isTime", "T10"));
        assert!(!check("isTime", "2017-10-12"));
        assert!(check("isDuration", "PT30M"));
        assert!(!check("isDuration", "T10"));
        assert!(check("isTimeRange", "TAF"));
        assert!(check("isDateRange", "2017-10"));
        assert!(check("isDateRange", "2017-SU"));
        assert!(check("isDateRange", "2017-W37"));
        assert!(!check("isDateRange", "2017-10-12"));
        assert!(check("isPresent", "PRESENT_REF"));
        assert!(!check("isPresent", "2017-10-12"));
    }

    #[test]
    fn test_range_takes_start_and_duration() {
        let property = TimexProperty::parse("(2017-10-12,2017-10-15,P3D)").unwrap();
        assert!(property.is_definite());
        assert_eq!(property.days, Some(3.0));
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let expr = FunctionRegistry::standard()
            .make_expression("isDate", vec![Expression::constant("tomorrow-ish")])
            .unwrap();
        let err = expr
            .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
            .unwrap_err();
        assert_eq!(err.message(), "tomorrow-ish is not a valid timex string.");
        assert!(TimexProperty::parse("P").is_err());
    }

    #[test]
    fn test_date_read_back() {
        let read_back = |reference: &str, target: &str| {
            FunctionRegistry::standard()
                .make_expression(
                    "dateReadBack",
                    vec![Expression::constant(reference), Expression::constant(target)],
                )
                .unwrap()
                .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
        };
        // 2018-03-15 is a Thursday.
        let text = |target: &str| {
            read_back("2018-03-15T13:00:00.000Z", target)
                .unwrap()
                .to_string()
        };
        assert_eq!(text("2018-03-15T23:59:00Z"), "today");
        assert_eq!(text("2018-03-16T08:00:00Z"), "tomorrow");
        assert_eq!(text("2018-03-14T08:00:00Z"), "yesterday");
        assert_eq!(text("2018-03-18T08:00:00Z"), "this Sunday");
        assert_eq!(text("2018-03-12T08:00:00Z"), "this Monday");
        assert_eq!(text("2018-03-21T08:00:00Z"), "next Wednesday");
        assert_eq!(text("2018-03-09T08:00:00Z"), "last Friday");
        assert_eq!(text("2018-04-01T08:00:00Z"), "1st April 2018");
        assert_eq!(text("2018-03-02T08:00:00Z"), "2nd March 2018");
        assert_eq!(text("2017-12-11T08:00:00Z"), "11th December 2017");
        assert_eq!(
            read_back("2018-03-15", "next week").unwrap_err().message(),
            "next week is not a valid datetime string."
        );
    }

    #[test]
    fn test_natural_language_without_year() {
        let reference = NaiveDate::from_ymd_opt(2018, 3, 15).unwrap();
        let property = TimexProperty::parse("XXXX-10-23").unwrap();
        assert_eq!(property.to_natural_language(reference).as_deref(), Some("23rd October"));
        let property = TimexProperty::parse("XXXX-WXX-5").unwrap();
        assert_eq!(property.to_natural_language(reference).as_deref(), Some("Friday"));
        assert_eq!(TimexProperty::parse("PT1H").unwrap().to_natural_language(reference), None);
    }

    #[test]
    fn test_object_fields() {
        let memory = SimpleObjectMemory::from(json!({
            "t": {"month": 10, "dayOfMonth": 12},
            "s": {"timex": "TEV"}
        }));
        let registry = FunctionRegistry::standard();
        let options = EvaluationOptions::default();
        let date = registry
            .make_expression("isDate", vec![Expression::accessor("t")])
            .unwrap();
        assert_eq!(date.evaluate(&memory, &options).unwrap(), Value::Boolean(true));
        let range = registry
            .make_expression("isTimeRange", vec![Expression::accessor("s")])
            .unwrap();
        assert_eq!(range.evaluate(&memory, &options).unwrap(), Value::Boolean(true));
    }
}
