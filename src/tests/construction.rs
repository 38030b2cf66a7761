use super::*;

#[test]
fn canonical_construction_restores_the_counter() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Pair () (val first) (val second))
        (val pair (new Pair (record :first 1 :second 2)))
        (record (first pair) (second pair) (constructing))
        "#,
    );
    assert_eq!(int_field(&value, "_0"), 1);
    assert_eq!(int_field(&value, "_1"), 2);
    assert!(value.get_field("_2").unwrap().as_int().is_none());
    assert_eq!(interp.initializing_count(), 0);
    assert!(interp.constructing_object().is_none());
}

#[test]
fn required_fields_must_be_supplied() {
    let (mut interp, _) = interpreter();
    let result = run(
        &mut interp,
        r#"
        (defclass Pair () (val first) (val second))
        (new Pair (record :first 1))
        "#,
    );
    assert_eq!(raised(result), "NoMethodError");
    assert_eq!(interp.initializing_count(), 0);
}

#[test]
fn init_that_skips_the_canonical_initializer_fails() {
    let (mut interp, _) = interpreter();
    let result = run(
        &mut interp,
        r#"
        (defclass Lazy () (var value 0))
        (def init (== Lazy) (n is Int) nothing)
        (new Lazy 3)
        "#,
    );
    let err = result.unwrap_err();
    assert_eq!(err.class_name(), Some("InitializationError"));
    assert_eq!(err.message(), "Instance of class Lazy was not initialized.");
    assert_eq!(interp.initializing_count(), 0);
}

#[test]
fn init_may_delegate_to_the_canonical_initializer() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Temperature () (var degrees 0))
        (def init (== Temperature) (n is Int)
          (init Temperature (record :degrees n)))
        (record (degrees (new Temperature 21)) (degrees (new Temperature)))
        "#,
    );
    assert_eq!(int_field(&value, "_0"), 21);
    assert_eq!(int_field(&value, "_1"), 0);
    assert_eq!(interp.initializing_count(), 0);
}

#[test]
fn reaching_the_canonical_initializer_twice_fails() {
    let (mut interp, _) = interpreter();
    let result = run(
        &mut interp,
        r#"
        (defclass Twice () (var n 0))
        (def init (== Twice) (n is Int)
          (init Twice nothing)
          (init Twice nothing))
        (new Twice 1)
        "#,
    );
    assert_eq!(raised(result), "InitializationError");
    assert_eq!(interp.initializing_count(), 0);
}

#[test]
fn parents_receive_the_field_named_after_them() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Animal () (val legs))
        (defclass Pet () (val owner))
        (defclass Cat (Animal Pet) (val name))
        (val tom (new Cat (record
          :Animal (record :legs 4)
          :owner "Ann"
          :name "Tom")))
        (record (legs tom) (owner tom) (name tom))
        "#,
    );
    assert_eq!(int_field(&value, "_0"), 4);
    assert_eq!(string_field(&value, "_1"), "Ann");
    assert_eq!(string_field(&value, "_2"), "Tom");
}

#[test]
fn a_failing_parent_init_unwinds_the_whole_construction() {
    let (mut interp, _) = interpreter();
    let result = run(
        &mut interp,
        r#"
        (defclass Base () (val id))
        (def init (== Base) (n is Int) nothing)
        (defclass Derived (Base))
        (new Derived (record :Base 7))
        "#,
    );
    assert_eq!(raised(result), "InitializationError");
    assert_eq!(interp.initializing_count(), 0);
    assert!(interp.constructing_object().is_none());
}

#[test]
fn nested_construction_inside_init_is_reentrant() {
    let (mut interp, _) = interpreter();
    let value = eval(
        &mut interp,
        r#"
        (defclass Leaf () (var size 1))
        (defclass Tree () (val leaf))
        (def init (== Tree) (n is Int)
          (init Tree (record :leaf (new Leaf))))
        (size (leaf (new Tree 0)))
        "#,
    );
    assert_eq!(value.as_int(), Some(1));
    assert_eq!(interp.initializing_count(), 0);
}
