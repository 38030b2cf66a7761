use crate::language::errors::SyntaxError;
use crate::runtime::value::Obj;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A language-level error object unwinding the evaluator.
    #[error("{}", describe_raised(.0))]
    Raised(Obj),
    /// Unrecoverable host-level condition; never catchable from the language.
    #[error("Fatal: {message}")]
    Quit { message: String },
    #[error("Syntax error in {path}: {error}")]
    Syntax {
        path: String,
        text: String,
        error: SyntaxError,
    },
}

impl RuntimeError {
    pub fn quit(message: impl Into<String>) -> Self {
        RuntimeError::Quit {
            message: message.into(),
        }
    }

    pub fn error_object(&self) -> Option<&Obj> {
        match self {
            RuntimeError::Raised(error) => Some(error),
            _ => None,
        }
    }

    /// Class name of a raised error object.
    pub fn class_name(&self) -> Option<&str> {
        self.error_object().map(|error| error.class().name())
    }

    pub fn message(&self) -> String {
        match self {
            RuntimeError::Raised(error) => error.as_str().unwrap_or_default().to_string(),
            RuntimeError::Quit { message } => message.clone(),
            RuntimeError::Syntax { error, .. } => error.message.clone(),
        }
    }
}

fn describe_raised(error: &Obj) -> String {
    match error.as_str() {
        Some(message) => format!("{}: {}", error.class().name(), message),
        None => error.class().name().to_string(),
    }
}
