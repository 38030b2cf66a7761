use crate::{language::errors::SyntaxError, project::ConfigError, runtime::error::RuntimeError};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource, err: SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
            label: err.label,
        }
    }
}

/// Renders a runtime failure for the terminal. Syntax errors get a labelled
/// source excerpt; raised error objects print their class and message.
pub fn render_runtime_error(error: &RuntimeError) -> String {
    match error {
        RuntimeError::Syntax { path, text, error } => {
            let src = NamedSource::new(path.clone(), text.clone());
            let diagnostic = SyntaxDiagnostic::from_error(src, error.clone());
            format!("{:?}", Report::new(diagnostic))
        }
        RuntimeError::Raised(_) => format!("Uncaught {error}"),
        RuntimeError::Quit { .. } => error.to_string(),
    }
}

pub fn report_runtime_error(error: &RuntimeError) {
    eprintln!("{}", render_runtime_error(error));
}

pub fn report_config_error(error: &ConfigError) {
    eprintln!("Configuration error: {error}");
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::span::Span;

    #[test]
    fn syntax_errors_render_with_source_excerpt() {
        let error = RuntimeError::Syntax {
            path: "demo.plm".to_string(),
            text: "(print \"hi\"".to_string(),
            error: SyntaxError::new("unexpected end of input", Span::new(11, 11)),
        };
        let rendered = render_runtime_error(&error);
        assert!(rendered.contains("unexpected end of input"));
    }

    #[test]
    fn quit_renders_its_message() {
        let rendered = render_runtime_error(&RuntimeError::quit("no base module"));
        assert!(rendered.contains("no base module"));
    }
}
