pub mod ast;
pub mod errors;
pub mod lower;
pub mod reader;
pub mod span;
pub mod syntax;
