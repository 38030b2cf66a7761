//! Well-known names shared by the reader, the builder and the runtime.

pub const INIT: &str = "init";
pub const EQEQ: &str = "==";
pub const TO_STRING: &str = "toString";
pub const CALL: &str = "call";
pub const NEW: &str = "new";

pub const CLASS: &str = "Class";
pub const ARRAY: &str = "Array";
pub const BOOL: &str = "Bool";
pub const EXPRESSION: &str = "Expression";
pub const FILE: &str = "File";
pub const FUNCTION: &str = "Function";
pub const INT: &str = "Int";
pub const LIST: &str = "List";
pub const NOTHING: &str = "Nothing";
pub const RECORD: &str = "Record";
pub const STRING: &str = "String";

pub const ERROR: &str = "Error";
pub const AMBIGUOUS_METHOD_ERROR: &str = "AmbiguousMethodError";
pub const IMMUTABLE_VARIABLE_ERROR: &str = "ImmutableVariableError";
pub const INITIALIZATION_ERROR: &str = "InitializationError";
pub const IO_ERROR: &str = "IOError";
pub const MODULE_ERROR: &str = "ModuleError";
pub const NO_METHOD_ERROR: &str = "NoMethodError";
pub const NO_VARIABLE_ERROR: &str = "NoVariableError";
pub const PARENT_COLLISION_ERROR: &str = "ParentCollisionError";
pub const TYPE_ERROR: &str = "TypeError";

pub const ERROR_CLASSES: &[&str] = &[
    AMBIGUOUS_METHOD_ERROR,
    IMMUTABLE_VARIABLE_ERROR,
    INITIALIZATION_ERROR,
    IO_ERROR,
    MODULE_ERROR,
    NO_METHOD_ERROR,
    NO_VARIABLE_ERROR,
    PARENT_COLLISION_ERROR,
    TYPE_ERROR,
];

/// Name of the setter generated for a mutable field.
pub fn assigner(field: &str) -> String {
    format!("{field}=")
}

/// Name of the field holding the `index`th positional record entry.
pub fn tuple_field(index: usize) -> String {
    format!("_{index}")
}
