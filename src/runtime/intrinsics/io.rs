use super::{define, expect_string};
use crate::names;
use crate::runtime::{
    builder::CoreEnvironment,
    environment::Scope,
    error::{RuntimeError, RuntimeResult},
    interpreter::Interpreter,
    pattern::Pattern,
    value::{Native, Obj},
};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::rc::Rc;

/// Native payload of a `File` object. Closing drops the reader.
#[derive(Debug)]
pub struct FileHandle {
    path: String,
    reader: RefCell<Option<BufReader<File>>>,
}

impl FileHandle {
    pub fn open(path: &str) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_string(),
            reader: RefCell::new(Some(BufReader::new(file))),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.borrow().is_some()
    }

    pub fn close(&self) {
        self.reader.borrow_mut().take();
    }

    fn read_to_end(&self) -> Option<std::io::Result<String>> {
        let mut reader = self.reader.borrow_mut();
        let reader = reader.as_mut()?;
        let mut contents = String::new();
        Some(reader.read_to_string(&mut contents).map(|_| contents))
    }

    /// `Ok(None)` at end of file.
    fn read_line(&self) -> Option<std::io::Result<Option<String>>> {
        let mut reader = self.reader.borrow_mut();
        let reader = reader.as_mut()?;
        let mut line = String::new();
        Some(reader.read_line(&mut line).map(|read| {
            if read == 0 {
                return None;
            }
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Some(line)
        }))
    }
}

pub fn register(scope: &Scope, core: &CoreEnvironment) {
    let nothing = || Pattern::Value(core.nothing_value.clone());
    let file = || Pattern::Class(core.file.clone());

    let file_class = core.file.clone();
    define(
        scope,
        "open",
        Pattern::Class(core.string.clone()),
        nothing(),
        move |interp, _, left, _| {
            let path = expect_string(interp, "open", &left)?;
            match FileHandle::open(&path) {
                Ok(handle) => interp.instantiate(&file_class, Some(Native::Host(Rc::new(handle)))),
                Err(error) => Err(interp.raise_error(
                    names::IO_ERROR,
                    format!("Could not open file \"{path}\": {error}."),
                )),
            }
        },
    );
    define(scope, "close", file(), nothing(), |interp, _, left, _| {
        handle(interp, &left)?.close();
        Ok(interp.nothing())
    });
    define(scope, "isOpen", file(), nothing(), |interp, _, left, _| {
        let open = handle(interp, &left)?.is_open();
        Ok(interp.create_bool(open))
    });
    define(scope, "read", file(), nothing(), |interp, _, left, _| {
        let result = handle(interp, &left)?.read_to_end();
        match result {
            Some(Ok(contents)) => Ok(interp.create_string(contents)),
            Some(Err(error)) => Err(read_failed(interp, error)),
            None => Err(closed(interp)),
        }
    });
    define(scope, "path", file(), nothing(), |interp, _, left, _| {
        let path = handle(interp, &left)?.path().to_string();
        Ok(interp.create_string(path))
    });
    define(scope, "readLine", file(), nothing(), |interp, _, left, _| {
        let result = handle(interp, &left)?.read_line();
        match result {
            Some(Ok(Some(line))) => Ok(interp.create_string(line)),
            Some(Ok(None)) => Ok(interp.nothing()),
            Some(Err(error)) => Err(read_failed(interp, error)),
            None => Err(closed(interp)),
        }
    });
}

fn handle<'a>(interp: &mut Interpreter, file: &'a Obj) -> RuntimeResult<&'a FileHandle> {
    match file.host::<FileHandle>() {
        Some(handle) => Ok(handle),
        None => Err(interp.raise_error(names::IO_ERROR, "File object has no open handle.")),
    }
}

fn read_failed(interp: &mut Interpreter, error: std::io::Error) -> RuntimeError {
    interp.raise_error(names::IO_ERROR, format!("Could not read: {error}."))
}

fn closed(interp: &mut Interpreter) -> RuntimeError {
    interp.raise_error(names::IO_ERROR, "File is closed.")
}
