use adaptive_expr::{BindError, ReturnType};

use crate::{constant, path, REGISTRY};

#[test]
fn test_unknown_function() {
    let err = REGISTRY.make_expression("frobnicate", vec![]).unwrap_err();
    assert_eq!(err, BindError::unknown_function("frobnicate"));
}

#[test]
fn test_arity_error() {
    let err = REGISTRY
        .make_expression("if", vec![constant(true)])
        .unwrap_err();
    assert!(matches!(err, BindError::Arity { found: 1, .. }));
}

#[test]
fn test_type_mismatch_on_constant() {
    let err = REGISTRY
        .make_expression("toUpper", vec![constant(1)])
        .unwrap_err();
    match err {
        BindError::TypeMismatch { position, expected, found, .. } => {
            assert_eq!(position, 0);
            assert_eq!(expected, ReturnType::STRING);
            assert_eq!(found, ReturnType::NUMBER);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_memory_paths_defer_type_checks() {
    assert!(REGISTRY.make_expression("toUpper", vec![path("user.name")]).is_ok());
}

#[test]
fn test_invalid_constant_regex() {
    let err = REGISTRY
        .make_expression("isMatch", vec![constant("a"), constant("[")])
        .unwrap_err();
    assert!(matches!(err, BindError::Invalid { .. }));
}
