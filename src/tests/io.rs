use super::*;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;

fn literal(path: &Path) -> String {
    let text = path.display().to_string();
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn read_lines_until_end_of_file() {
    let file = temp_file("first\r\nsecond\n");
    let (mut interp, _) = interpreter();
    let source = format!(
        r#"
        (val f (open {}))
        (val one (readLine f))
        (val two (readLine f))
        (val three (readLine f))
        (val was-open (isOpen f))
        (close f)
        (record one two three was-open (isOpen f))
        "#,
        literal(file.path())
    );
    let value = eval(&mut interp, &source);
    assert_eq!(string_field(&value, "_0"), "first");
    assert_eq!(string_field(&value, "_1"), "second");
    assert!(Rc::ptr_eq(&value.get_field("_2").unwrap(), &interp.nothing()));
    assert_eq!(value.get_field("_3").unwrap().as_bool(), Some(true));
    assert_eq!(value.get_field("_4").unwrap().as_bool(), Some(false));
}

#[test]
fn read_returns_the_whole_file() {
    let file = temp_file("alpha\nbeta\n");
    let (mut interp, _) = interpreter();
    let value = eval(&mut interp, &format!("(read (open {}))", literal(file.path())));
    assert_eq!(value.as_str(), Some("alpha\nbeta\n"));
}

#[test]
fn missing_files_raise_io_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("missing.txt");
    let (mut interp, _) = interpreter();

    let result = run(&mut interp, &format!("(open {})", literal(&missing)));
    assert_eq!(raised(result), "IOError");

    let caught = eval(
        &mut interp,
        &format!("(try (open {}) (catch IOError _ \"caught\"))", literal(&missing)),
    );
    assert_eq!(caught.as_str(), Some("caught"));
}

#[test]
fn reading_a_closed_file_raises_io_error() {
    let file = temp_file("text");
    let (mut interp, _) = interpreter();
    let err = run(
        &mut interp,
        &format!("(val f (open {})) (close f) (readLine f)", literal(file.path())),
    )
    .unwrap_err();
    assert_eq!(err.class_name(), Some("IOError"));
    assert_eq!(err.message(), "File is closed.");
}

#[test]
fn print_writes_to_the_configured_output() {
    let (mut interp, output) = interpreter();
    run(&mut interp, "(print \"hello\") (print 42)").unwrap();
    assert_eq!(output.text(), "hello\n42\n");
}
