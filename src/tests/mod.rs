mod construction;
mod equality;
mod errors;
mod io;
mod records;

use crate::project::{BundledHost, MemoryHost, RuntimeConfig, SourceFile};
use crate::runtime::{Interpreter, Obj, RuntimeResult};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Captures everything `print` writes.
#[derive(Clone, Default)]
pub(crate) struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub(crate) fn interpreter() -> (Interpreter, Output) {
    interpreter_with(MemoryHost::new())
}

pub(crate) fn interpreter_with(host: MemoryHost) -> (Interpreter, Output) {
    let config = RuntimeConfig::default();
    let mut interp = Interpreter::bootstrap(BundledHost::new(host, &config), &config)
        .unwrap_or_else(|err| panic!("bootstrap failed: {err}"));
    let output = Output::default();
    interp.set_output(Box::new(output.clone()));
    (interp, output)
}

pub(crate) fn run(interp: &mut Interpreter, source: &str) -> RuntimeResult<Obj> {
    interp.interpret(SourceFile::new("<test>", source))
}

pub(crate) fn eval(interp: &mut Interpreter, source: &str) -> Obj {
    run(interp, source).unwrap_or_else(|err| panic!("evaluation failed: {err}\n{source}"))
}

/// Class name of the error object a failed evaluation raised.
pub(crate) fn raised(result: RuntimeResult<Obj>) -> String {
    match result {
        Ok(value) => panic!("expected an error, got {value:?}"),
        Err(err) => match err.class_name() {
            Some(name) => name.to_string(),
            None => panic!("expected a raised error, got {err}"),
        },
    }
}

pub(crate) fn int_field(record: &Obj, field: &str) -> i64 {
    record
        .get_field(field)
        .and_then(|value| value.as_int())
        .unwrap_or_else(|| panic!("field {field} is not an Int in {record:?}"))
}

pub(crate) fn string_field(record: &Obj, field: &str) -> String {
    record
        .get_field(field)
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| panic!("field {field} is not a String in {record:?}"))
}
