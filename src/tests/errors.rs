use super::*;

#[test]
fn unknown_variables_raise_catchable_errors() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        "(try undefined-name (catch NoVariableError e (message e)))",
    );
    assert_eq!(
        value.as_str(),
        Some("Could not find a variable named \"undefined-name\".")
    );
}

#[test]
fn immutable_variables_cannot_be_assigned() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (val fixed 1)
        (var counter 1)
        (set! counter 2)
        (record counter (try (set! fixed 2) (catch ImmutableVariableError _ "immutable")))
        "#,
    );
    assert_eq!(int_field(&value, "_0"), 2);
    assert_eq!(string_field(&value, "_1"), "immutable");
}

#[test]
fn catch_matches_error_subclasses() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass ParseError (Error))
        (record
          (try (raise TypeError "bad") (catch Error e (toString e)))
          (try (raise ParseError "oops") (catch IOError _ "io") (catch ParseError e (message e))))
        "#,
    );
    assert_eq!(string_field(&value, "_0"), "TypeError: bad");
    assert_eq!(string_field(&value, "_1"), "oops");
}

#[test]
fn unmatched_errors_keep_unwinding() {
    let (mut interp, _) = interpreter();
    let err = run(&mut interp, "(try (raise TypeError \"x\") (catch IOError _ 1))").unwrap_err();
    assert_eq!(err.class_name(), Some("TypeError"));
    assert_eq!(err.to_string(), "TypeError: x");
}

#[test]
fn overflow_raises_type_error() {
    let (mut interp, _) = interpreter();
    let result = run(&mut interp, "(* 9223372036854775807 2)");
    assert_eq!(raised(result), "TypeError");
}

#[test]
fn assert_syntax_raises_error() {
    let (mut interp, _) = interpreter();
    let err = run(&mut interp, "(assert (== 1 2) \"numbers differ\")").unwrap_err();
    assert_eq!(err.class_name(), Some("Error"));
    assert_eq!(err.message(), "numbers differ");
    assert!(run(&mut interp, "(assert (== 1 1) \"fine\")").is_ok());
}

#[test]
fn syntax_errors_are_not_error_objects() {
    let (mut interp, _) = interpreter();
    match run(&mut interp, "(print 1") {
        Err(crate::runtime::RuntimeError::Syntax { path, error, .. }) => {
            assert_eq!(path, "<test>");
            assert_eq!(error.message, "unexpected end of input");
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}
