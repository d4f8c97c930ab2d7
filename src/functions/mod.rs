//! Builtin operator families.
//!
//! Each family exposes its definitions through `definitions()`; the
//! registry collects them in [`builtins`].

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::expression::OperatorDefinition;
use crate::{EvalError, EvalResult, EvaluationOptions, Value};

pub mod accessor;
mod codec;
mod collection;
mod comparison;
mod conversion;
pub mod datetime;
mod json;
mod logic;
mod matching;
mod math;
mod predicates;
mod string;
mod timex;
mod uri;

pub(crate) fn builtins() -> Vec<Arc<OperatorDefinition>> {
    let families = [
        accessor::definitions(),
        math::definitions(),
        comparison::definitions(),
        logic::definitions(),
        string::definitions(),
        collection::definitions(),
        conversion::definitions(),
        codec::definitions(),
        json::definitions(),
        datetime::definitions(),
        timex::definitions(),
        uri::definitions(),
        matching::definitions(),
        predicates::definitions(),
    ];
    std::iter::once(accessor::accessor_definition())
        .chain(families.into_iter().flatten().map(Arc::new))
        .collect()
}

lazy_static! {
    static ref LOCALE: Regex = Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap();
}

/// Locale given as argument `index`, falling back to the options.
pub(crate) fn locale_arg(
    args: &[Value],
    index: usize,
    options: &EvaluationOptions,
) -> EvalResult<String> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(options.locale.clone()),
        Some(Value::String(locale)) if LOCALE.is_match(locale) => Ok(locale.clone()),
        Some(other) => Err(EvalError::invalid(format!(
            "{} is not a valid locale.",
            other
        ))),
    }
}

/// Primary language subtag, lowercased: `tr` for `tr-TR`.
pub(crate) fn language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
