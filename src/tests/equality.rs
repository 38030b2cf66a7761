use super::*;

#[test]
fn identity_and_boolean_rules() {
    let (mut interp, _) = interpreter();
    let yes = interp.create_bool(true);
    let no = interp.create_bool(false);
    let text = interp.create_string("a");
    assert!(interp.values_equal(&text, &text).unwrap());
    assert!(!interp.values_equal(&yes, &no).unwrap());
    let also_yes = interp.create_bool(true);
    assert!(interp.values_equal(&yes, &also_yes).unwrap());
}

#[test]
fn primitive_equality_compares_values() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"(record (== 1 1) (== "a" "a") (!= 1 2) (== 1 "1") (equal? nothing nothing))"#,
    );
    for (field, expected) in [("_0", true), ("_1", true), ("_2", true), ("_3", false), ("_4", true)] {
        assert_eq!(
            value.get_field(field).unwrap().as_bool(),
            Some(expected),
            "field {field}"
        );
    }
}

#[test]
fn user_equality_is_used_by_value_patterns() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Money () (val cents))
        (def == (a is Money) (b is Money) (== (cents a) (cents b)))
        (val price (new Money (record :cents 100)))
        (def label (== price) nothing "one dollar")
        (def label _ nothing "something else")
        (record
          (label (new Money (record :cents 100)))
          (label (new Money (record :cents 5)))
          (equal? price (new Money (record :cents 100))))
        "#,
    );
    assert_eq!(string_field(&value, "_0"), "one dollar");
    assert_eq!(string_field(&value, "_1"), "something else");
    assert_eq!(value.get_field("_2").unwrap().as_bool(), Some(true));
}

#[test]
fn recursive_equality_falls_back_to_identity() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Node () (var next nothing))
        (def == (a is Node) (b is Node) (equal? a b))
        (val node (new Node))
        (record (equal? node (new Node)) (equal? node node))
        "#,
    );
    assert_eq!(value.get_field("_0").unwrap().as_bool(), Some(false));
    assert_eq!(value.get_field("_1").unwrap().as_bool(), Some(true));
}
