use super::*;

#[test]
fn positional_fields_are_numbered() {
    let (mut interp, _) = interpreter();
    let value = eval(&mut interp, "(record 1 \"a\")");
    assert_eq!(value.field_names(), vec!["_0", "_1"]);
    assert_eq!(int_field(&value, "_0"), 1);
    assert_eq!(string_field(&value, "_1"), "a");
    assert_eq!(interp.evaluate_to_string(&value).unwrap(), "(1, a)");

    let second = eval(&mut interp, "(field (record 1 \"a\") \"_1\")");
    assert_eq!(second.as_str(), Some("a"));
}

#[test]
fn named_fields_print_sorted() {
    let (mut interp, _) = interpreter();
    let value = eval(&mut interp, "(record :y 2 :x 1)");
    assert_eq!(interp.evaluate_to_string(&value).unwrap(), "(x: 1, y: 2)");
}

#[test]
fn records_built_from_the_embedding_api() {
    let (mut interp, _) = interpreter();
    let tuple = interp.create_tuple(vec![interp.create_int(7), interp.nothing()]);
    assert_eq!(interp.evaluate_to_string(&tuple).unwrap(), "(7, nothing)");
    let named = interp.create_record(vec![("name".to_string(), interp.create_string("plume"))]);
    assert_eq!(named.get_field("name").unwrap().as_str(), Some("plume"));
}

#[test]
fn record_patterns_destructure_arguments() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (def norm (record :x x :y y) nothing (+ (* x x) (* y y)))
        (def norm (record :x x) nothing (* x x))
        (record (norm (record :x 3 :y 4)) (norm (record :x 5)))
        "#,
    );
    assert_eq!(int_field(&value, "_0"), 25);
    assert_eq!(int_field(&value, "_1"), 25);
}

#[test]
fn duplicate_record_fields_are_syntax_errors() {
    let (mut interp, _) = interpreter();
    let err = run(&mut interp, "(record :a 1 :a 2)").unwrap_err();
    assert!(matches!(err, crate::runtime::RuntimeError::Syntax { .. }));
}
