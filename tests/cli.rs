use std::{
    env, fs,
    path::PathBuf,
    process::{Command, Output},
};
use tempfile::TempDir;

fn bin_path() -> String {
    if let Some(path) = option_env!("CARGO_BIN_EXE_plume") {
        return path.to_string();
    }
    let mut fallback =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("manifest dir not set by cargo"));
    fallback.push("target");
    fallback.push("debug");
    fallback.push("plume");
    if cfg!(windows) {
        fallback.set_extension("exe");
    }
    if fallback.exists() {
        return fallback.to_string_lossy().into_owned();
    }
    panic!(
        "binary path not set by cargo test and fallback {:?} not found",
        fallback
    );
}

fn run_script(dir: &TempDir, file: &str, source: &str) -> Output {
    let path = dir.path().join(file);
    fs::write(&path, source).expect("write script");
    Command::new(bin_path())
        .current_dir(dir.path())
        .arg("run")
        .arg(&path)
        .env_remove("PLUME_LOG")
        .output()
        .expect("failed to run plume")
}

#[test]
fn run_prints_to_stdout() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_script(
        &dir,
        "hello.plm",
        "(defclass Greeting () (val who))\n(print (+ \"hello, \" (who (construct Greeting (record :who \"plume\")))))\n",
    );
    assert!(
        output.status.success(),
        "plume run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello, plume\n");
}

#[test]
fn scripts_import_modules_next_to_them() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir(dir.path().join("util")).expect("module dir");
    fs::write(dir.path().join("util").join("math.plm"), "(def square (n is Int) nothing (* n n))\n")
        .expect("write module");
    let output = run_script(&dir, "main.plm", "(import \"util.math\")\n(print (square 7))\n");
    assert!(
        output.status.success(),
        "plume run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "49\n");
}

#[test]
fn uncaught_errors_exit_with_failure() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_script(&dir, "fail.plm", "(raise TypeError \"bad input\")\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad input"));
}

#[test]
fn wrong_extension_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_script(&dir, "script.txt", "(print 1)\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid file extension"));
}
