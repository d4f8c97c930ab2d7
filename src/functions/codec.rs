//! Base64, data URI and URI component codecs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::expression::evaluation::{apply, string_or_empty, verify_string_or_null};
use crate::expression::validation::{validate_unary, validate_unary_string};
use crate::expression::OperatorDefinition;
use crate::{EvalError, EvalResult, ReturnType, Value};

pub const DATA_URI_PREFIX: &str = "data:text/plain;charset=utf-8;base64,";

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "base64",
            ReturnType::STRING,
            apply(|args| Ok(Value::String(STANDARD.encode(bytes(&args[0])?))), None),
            validate_unary,
        ),
        string_codec("base64ToBinary", ReturnType::OBJECT, |s| {
            decode_base64(s).map(Value::Binary)
        }),
        string_codec("base64ToString", ReturnType::STRING, |s| {
            decode_base64(s).and_then(utf8)
        }),
        string_codec("binary", ReturnType::OBJECT, |s| {
            Ok(Value::Binary(s.as_bytes().to_vec()))
        }),
        string_codec("dataUri", ReturnType::STRING, |s| {
            Ok(Value::String(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(s))))
        }),
        string_codec("dataUriToBinary", ReturnType::OBJECT, |s| {
            data_uri_payload(s).map(Value::Binary)
        }),
        string_codec("dataUriToString", ReturnType::STRING, |s| {
            data_uri_payload(s).and_then(utf8)
        }),
        string_codec("uriComponent", ReturnType::STRING, |s| {
            Ok(Value::String(encode_uri_component(s)))
        }),
        string_codec("uriComponentToString", ReturnType::STRING, |s| {
            decode_uri_component(s).map(Value::String)
        }),
    ]
}

fn string_codec(
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

fn bytes(value: &Value) -> EvalResult<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Binary(b) => Ok(b.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(EvalError::invalid(format!(
            "{} is neither a string nor binary data.",
            other
        ))),
    }
}

fn decode_base64(s: &str) -> EvalResult<Vec<u8>> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| EvalError::parse(format!("{} is not a valid base64 string: {}", s, e)))
}

fn utf8(bytes: Vec<u8>) -> EvalResult<Value> {
    String::from_utf8(bytes)
        .map(Value::String)
        .map_err(|_| EvalError::parse("decoded data is not valid UTF-8."))
}

fn data_uri_payload(s: &str) -> EvalResult<Vec<u8>> {
    let invalid = || EvalError::parse(format!("{} is not a valid data URI.", s));
    let (header, payload) = s
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(invalid)?;
    if header.ends_with(";base64") {
        decode_base64(payload)
    } else {
        decode_uri_component(payload).map(String::into_bytes)
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b)
}

pub(crate) fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

pub(crate) fn decode_uri_component(s: &str) -> EvalResult<String> {
    let invalid = || EvalError::parse(format!("{} is not a valid URI component.", s));
    let input = s.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            let hex = input.get(i + 1..i + 3).ok_or_else(invalid)?;
            let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
            out.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
            i += 3;
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| invalid())
}
