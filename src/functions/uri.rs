//! URI decomposition over absolute URIs.

use url::Url;

use crate::expression::evaluation::{apply, verify_string};
use crate::expression::validation::validate_unary_string;
use crate::expression::OperatorDefinition;
use crate::{EvalError, EvalResult, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        uri_part("uriHost", ReturnType::STRING, |uri| {
            Ok(Value::from(uri.host_str().unwrap_or_default()))
        }),
        uri_part("uriPath", ReturnType::STRING, |uri| Ok(Value::from(uri.path()))),
        uri_part("uriPathAndQuery", ReturnType::STRING, |uri| {
            Ok(Value::String(format!("{}{}", uri.path(), query(uri))))
        }),
        uri_part("uriQuery", ReturnType::STRING, |uri| Ok(Value::String(query(uri)))),
        uri_part("uriPort", ReturnType::NUMBER, |uri| {
            uri.port_or_known_default()
                .map(|port| Value::Integer(port as i64))
                .ok_or_else(|| EvalError::invalid(format!("{} has no port.", uri)))
        }),
        uri_part("uriScheme", ReturnType::STRING, |uri| Ok(Value::from(uri.scheme()))),
    ]
}

fn uri_part(
    name: &'static str,
    return_type: ReturnType,
    extract: fn(&Url) -> EvalResult<Value>,
) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        return_type,
        apply(
            move |args| extract(&parse_uri(args[0].as_str().unwrap_or_default())?),
            Some(verify_string),
        ),
        validate_unary_string,
    )
}

/// Parse an absolute URI; relative references are rejected.
pub fn parse_uri(s: &str) -> EvalResult<Url> {
    Url::parse(s).map_err(|_| EvalError::invalid(format!("{} is not a valid URI.", s)))
}

/// Query string including its leading `?`, or empty.
fn query(uri: &Url) -> String {
    match uri.query() {
        Some(q) if !q.is_empty() => format!("?{}", q),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::memory::SimpleObjectMemory;
    use crate::{EvaluationOptions, FunctionRegistry};
    use pretty_assertions::assert_eq;

    const URI: &str = "https://www.contoso.com:8080/api/items?id=3&name=x#top";

    fn call(name: &str, uri: &str) -> EvalResult<Value> {
        FunctionRegistry::standard()
            .make_expression(name, vec![Expression::constant(uri)])
            .unwrap()
            .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
    }

    #[test]
    fn test_components() {
        assert_eq!(call("uriHost", URI).unwrap(), Value::from("www.contoso.com"));
        assert_eq!(call("uriPath", URI).unwrap(), Value::from("/api/items"));
        assert_eq!(
            call("uriPathAndQuery", URI).unwrap(),
            Value::from("/api/items?id=3&name=x")
        );
        assert_eq!(call("uriQuery", URI).unwrap(), Value::from("?id=3&name=x"));
        assert_eq!(call("uriPort", URI).unwrap(), Value::Integer(8080));
        assert_eq!(call("uriScheme", URI).unwrap(), Value::from("https"));
    }

    #[test]
    fn test_default_port() {
        assert_eq!(call("uriPort", "http://example.com/").unwrap(), Value::Integer(80));
        assert_eq!(call("uriQuery", "http://example.com/a").unwrap(), Value::from(""));
    }

    #[test]
    fn test_relative_uri_is_rejected() {
        assert_eq!(
            call("uriHost", "/relative/path").unwrap_err().message(),
            "/relative/path is not a valid URI."
        );
    }
}
