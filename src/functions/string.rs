//! String operators.
//!
//! A null string argument reads as the empty string throughout.

use regex::{NoExpand, RegexBuilder};
use uuid::Uuid;

use super::{language, locale_arg};
use crate::expression::evaluation::{
    apply, apply_with_options, integer_arg, string_or_empty, verify_integer,
    verify_string_or_null,
};
use crate::expression::validation::{
    validate_arity_and_any_type, validate_binary_string, validate_no_children, validate_order,
    validate_unary_or_binary_string, validate_unary_string,
};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalError, EvalResult, EvaluationOptions, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "concat",
            ReturnType::STRING | ReturnType::ARRAY,
            apply(concat, None),
            |e: &Expression| validate_arity_and_any_type(e, 1, usize::MAX, ReturnType::ANY),
        ),
        string_fn("length", ReturnType::NUMBER, |s| {
            Ok(Value::Integer(s.chars().count() as i64))
        }),
        OperatorDefinition::new(
            "replace",
            ReturnType::STRING,
            apply(|args| replace(args, false), Some(verify_string_or_null)),
            validate_replace,
        ),
        OperatorDefinition::new(
            "replaceIgnoreCase",
            ReturnType::STRING,
            apply(|args| replace(args, true), Some(verify_string_or_null)),
            validate_replace,
        ),
        OperatorDefinition::new(
            "split",
            ReturnType::ARRAY,
            apply(split, Some(verify_string_or_null)),
            validate_unary_or_binary_string,
        ),
        OperatorDefinition::new(
            "substring",
            ReturnType::STRING,
            apply(substring, None),
            |e: &Expression| {
                validate_order(
                    e,
                    &[ReturnType::NUMBER],
                    &[ReturnType::STRING, ReturnType::NUMBER],
                )
            },
        ),
        transform("toLower", to_lower),
        transform("toUpper", to_upper),
        transform("sentenceCase", |s, locale| {
            let lower = to_lower(s, locale);
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => to_upper(&first.to_string(), locale) + chars.as_str(),
                None => String::new(),
            }
        }),
        transform("titleCase", |s, locale| {
            to_lower(s, locale)
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => to_upper(&first.to_string(), locale) + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        }),
        string_fn("trim", ReturnType::STRING, |s| Ok(Value::from(s.trim()))),
        OperatorDefinition::new(
            "startsWith",
            ReturnType::BOOLEAN,
            apply(
                |args| {
                    let (s, prefix) = (string_or_empty(args, 0), string_or_empty(args, 1));
                    Ok(Value::Boolean(s.starts_with(&prefix)))
                },
                Some(verify_string_or_null),
            ),
            validate_binary_string,
        ),
        OperatorDefinition::new(
            "endsWith",
            ReturnType::BOOLEAN,
            apply(
                |args| {
                    let (s, suffix) = (string_or_empty(args, 0), string_or_empty(args, 1));
                    Ok(Value::Boolean(s.ends_with(&suffix)))
                },
                Some(verify_string_or_null),
            ),
            validate_binary_string,
        ),
        OperatorDefinition::new(
            "indexOf",
            ReturnType::NUMBER,
            apply(|args| index_of(args, false), None),
            validate_index_of,
        ),
        OperatorDefinition::new(
            "lastIndexOf",
            ReturnType::NUMBER,
            apply(|args| index_of(args, true), None),
            validate_index_of,
        ),
        string_fn("countWord", ReturnType::NUMBER, |s| {
            Ok(Value::Integer(s.split_whitespace().count() as i64))
        }),
        OperatorDefinition::new(
            "addOrdinal",
            ReturnType::STRING,
            apply(
                |args| Ok(Value::String(add_ordinal(integer_arg(args, 0, "addOrdinal")?))),
                Some(verify_integer),
            ),
            |e: &Expression| validate_order(e, &[], &[ReturnType::NUMBER]),
        ),
        OperatorDefinition::new(
            "newGuid",
            ReturnType::STRING,
            apply(|_| Ok(Value::String(Uuid::new_v4().to_string())), None),
            validate_no_children,
        ),
        OperatorDefinition::new(
            "join",
            ReturnType::STRING,
            apply(join, None),
            |e: &Expression| {
                validate_order(
                    e,
                    &[ReturnType::STRING],
                    &[ReturnType::ARRAY, ReturnType::STRING],
                )
            },
        ),
    ]
}

/// Unary operator over one string-or-null argument.
fn string_fn(
    name: &'static str,
    return_type: ReturnType,
    f: fn(&str) -> EvalResult<Value>,
) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        return_type,
        apply(move |args| f(&string_or_empty(args, 0)), Some(verify_string_or_null)),
        validate_unary_string,
    )
}

/// String transform taking an optional locale as second argument.
fn transform(name: &'static str, f: fn(&str, &str) -> String) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::STRING,
        apply_with_options(
            move |args: &[Value], options: &EvaluationOptions| {
                let locale = locale_arg(args, 1, options)?;
                Ok(Value::String(f(&string_or_empty(args, 0), &locale)))
            },
            Some(verify_string_or_null),
        ),
        validate_unary_or_binary_string,
    )
}

fn is_turkic(locale: &str) -> bool {
    matches!(language(locale).as_str(), "tr" | "az")
}

pub(crate) fn to_lower(s: &str, locale: &str) -> String {
    if !is_turkic(locale) {
        return s.to_lowercase();
    }
    s.chars()
        .map(|c| match c {
            'I' => "ı".to_string(),
            'İ' => "i".to_string(),
            c => c.to_lowercase().collect(),
        })
        .collect()
}

pub(crate) fn to_upper(s: &str, locale: &str) -> String {
    if !is_turkic(locale) {
        return s.to_uppercase();
    }
    s.chars()
        .map(|c| match c {
            'i' => "İ".to_string(),
            'ı' => "I".to_string(),
            c => c.to_uppercase().collect(),
        })
        .collect()
}

fn concat(args: &[Value]) -> EvalResult<Value> {
    if args.iter().all(|v| matches!(v, Value::Array(_))) {
        let items = args
            .iter()
            .filter_map(Value::as_array)
            .flat_map(|items| items.iter().cloned())
            .collect();
        return Ok(Value::Array(items));
    }
    Ok(Value::String(
        args.iter()
            .map(|v| if v.is_null() { String::new() } else { v.to_string() })
            .collect(),
    ))
}

fn validate_replace(expression: &Expression) -> crate::BindResult<()> {
    validate_order(
        expression,
        &[],
        &[ReturnType::STRING, ReturnType::STRING, ReturnType::STRING],
    )
}

fn replace(args: &[Value], ignore_case: bool) -> EvalResult<Value> {
    let s = string_or_empty(args, 0);
    let old = string_or_empty(args, 1);
    let new = string_or_empty(args, 2);
    if old.is_empty() {
        return Err(EvalError::invalid(format!(
            "{} should be a string with length at least 1.",
            args[1]
        )));
    }
    if !ignore_case {
        return Ok(Value::String(s.replace(&old, &new)));
    }
    let pattern = RegexBuilder::new(&regex::escape(&old))
        .case_insensitive(true)
        .build()
        .map_err(|e| EvalError::invalid(e.to_string()))?;
    Ok(Value::String(
        pattern.replace_all(&s, NoExpand(&new)).into_owned(),
    ))
}

fn split(args: &[Value]) -> EvalResult<Value> {
    let s = string_or_empty(args, 0);
    let separator = string_or_empty(args, 1);
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(separator.as_str()).map(Value::from).collect()
    };
    Ok(Value::Array(parts))
}

fn substring(args: &[Value]) -> EvalResult<Value> {
    let s = match &args[0] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => return Err(EvalError::invalid(format!("{} is not a string.", other))),
    };
    let chars: Vec<char> = s.chars().collect();
    let start = args[1]
        .as_integer()
        .filter(|start| *start >= 0 && (*start as usize) <= chars.len())
        .ok_or_else(|| {
            EvalError::invalid(format!(
                "{} is not a valid starting index for a string of length {}.",
                args[1],
                chars.len()
            ))
        })? as usize;
    let length = match args.get(2) {
        None => chars.len() - start,
        Some(length) => length
            .as_integer()
            .filter(|l| *l >= 0 && start + (*l as usize) <= chars.len())
            .ok_or_else(|| {
                EvalError::invalid(format!(
                    "{} is not a valid length for a substring starting at {}.",
                    length, start
                ))
            })? as usize,
    };
    Ok(Value::String(chars[start..start + length].iter().collect()))
}

fn validate_index_of(expression: &Expression) -> crate::BindResult<()> {
    validate_order(
        expression,
        &[],
        &[ReturnType::STRING | ReturnType::ARRAY, ReturnType::ANY],
    )
}

fn index_of(args: &[Value], last: bool) -> EvalResult<Value> {
    let found = match (&args[0], &args[1]) {
        (Value::Null, _) => None,
        (Value::String(s), Value::String(needle)) => {
            let byte_index = if last { s.rfind(needle.as_str()) } else { s.find(needle.as_str()) };
            byte_index.map(|i| s[..i].chars().count())
        }
        (Value::String(_), other) => {
            return Err(EvalError::invalid(format!("{} is not a string.", other)))
        }
        (Value::Array(items), needle) => {
            if last {
                items.iter().rposition(|item| item == needle)
            } else {
                items.iter().position(|item| item == needle)
            }
        }
        (other, _) => {
            return Err(EvalError::invalid(format!(
                "{} must be a string or list.",
                other
            )))
        }
    };
    Ok(Value::Integer(found.map(|i| i as i64).unwrap_or(-1)))
}

fn add_ordinal(n: i64) -> String {
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn join(args: &[Value]) -> EvalResult<Value> {
    let Value::Array(items) = &args[0] else {
        return Err(EvalError::invalid(format!("{} is not a list.", args[0])));
    };
    let separator = string_or_empty(args, 1);
    let items: Vec<String> = items.iter().map(Value::to_string).collect();
    let joined = match (args.get(2), items.split_last()) {
        (Some(last_separator), Some((last, init))) if !init.is_empty() => format!(
            "{}{}{}",
            init.join(&separator),
            string_or_empty(std::slice::from_ref(last_separator), 0),
            last
        ),
        _ => items.join(&separator),
    };
    Ok(Value::String(joined))
}
