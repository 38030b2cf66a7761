#![allow(clippy::collapsible_if)]

pub mod diagnostics;
pub mod language;
pub mod names;
pub mod project;
pub mod runtime;

pub use project::config::RuntimeConfig;
pub use runtime::Interpreter;

#[cfg(test)]
mod tests;
