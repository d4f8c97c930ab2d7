//! Type conversion and number formatting.

use rand::Rng;

use super::{language, locale_arg};
use crate::expression::evaluation::{apply, apply_with_options, integer_arg, verify_integer};
use crate::expression::validation::{validate_binary_number, validate_order, validate_unary};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalError, EvalResult, EvaluationOptions, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new("float", ReturnType::NUMBER, apply(to_float, None), validate_unary),
        OperatorDefinition::new("int", ReturnType::NUMBER, apply(to_int, None), validate_unary),
        OperatorDefinition::new(
            "string",
            ReturnType::STRING,
            apply_with_options(
                |args: &[Value], options: &EvaluationOptions| {
                    locale_arg(args, 1, options)?;
                    Ok(Value::String(args[0].to_string()))
                },
                None,
            ),
            |e: &Expression| validate_order(e, &[ReturnType::STRING], &[ReturnType::ANY]),
        ),
        OperatorDefinition::new(
            "bool",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(args[0].is_truthy())), None),
            validate_unary,
        ),
        OperatorDefinition::new(
            "formatNumber",
            ReturnType::STRING,
            apply_with_options(format_number, None),
            |e: &Expression| {
                validate_order(
                    e,
                    &[ReturnType::STRING],
                    &[ReturnType::NUMBER, ReturnType::NUMBER],
                )
            },
        ),
        OperatorDefinition::new(
            "rand",
            ReturnType::NUMBER,
            apply(random, Some(verify_integer)),
            validate_binary_number,
        ),
    ]
}

fn invalid_number(value: &Value) -> EvalError {
    EvalError::parse(format!("parameter {} is not a valid number string.", value))
}

fn to_float(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid_number(&args[0])),
        other => Err(invalid_number(other)),
    }
}

fn to_int(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Integer(f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .map(Value::Integer)
                .ok_or_else(|| invalid_number(&args[0]))
        }
        other => Err(invalid_number(other)),
    }
}

/// Group and decimal separators for a locale.
fn separators(locale: &str) -> (&'static str, &'static str) {
    match language(locale).as_str() {
        "de" | "es" | "it" | "pt" | "nl" | "tr" | "id" | "da" | "el" => (".", ","),
        "fr" | "ru" | "pl" | "cs" | "sv" | "fi" | "nb" | "uk" | "sk" | "hu" => ("\u{a0}", ","),
        _ => (",", "."),
    }
}

fn format_number(args: &[Value], options: &EvaluationOptions) -> EvalResult<Value> {
    let number = args[0]
        .as_f64()
        .ok_or_else(|| EvalError::invalid(format!("{} is not a number.", args[0])))?;
    let precision = integer_arg(args, 1, "precision")
        .ok()
        .filter(|p| (0..=20).contains(p))
        .ok_or_else(|| {
            EvalError::invalid(format!("{} is not a valid precision.", args[1]))
        })? as usize;
    let locale = locale_arg(args, 2, options)?;
    let (group, decimal) = separators(&locale);

    let fixed = format!("{:.*}", precision, number.abs());
    let (integer_part, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };
    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(group);
        }
        grouped.push(*c);
    }
    let sign = if number < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    let formatted = match fraction {
        Some(fraction) => format!("{}{}{}{}", sign, grouped, decimal, fraction),
        None => format!("{}{}", sign, grouped),
    };
    Ok(Value::String(formatted))
}

fn random(args: &[Value]) -> EvalResult<Value> {
    let min = integer_arg(args, 0, "min")?;
    let max = integer_arg(args, 1, "max")?;
    if min > max {
        return Err(EvalError::invalid(format!(
            "Min value {} cannot be greater than max value {}.",
            min, max
        )));
    }
    if min == max {
        return Ok(Value::Integer(min));
    }
    Ok(Value::Integer(rand::thread_rng().gen_range(min..max)))
}
