pub mod builder;
pub mod class;
pub mod environment;
pub mod error;
mod eval;
pub mod interpreter;
pub mod intrinsics;
pub mod module;
pub mod multimethod;
pub mod pattern;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::Interpreter;
pub use value::Obj;
