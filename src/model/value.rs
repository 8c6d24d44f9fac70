use std::fmt::Display;

use super::constant_pool::ConstantPoolIndex;

/// A value living on the operand stack or in a local variable slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JvmValue {
    Int(i32),
    /// Text produced by `ldc` from a string constant.
    String(String),
    /// A static field handle, as pushed by `getstatic`.
    Field(ConstantPoolIndex),
}

impl JvmValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            JvmValue::Int(_) => "int",
            JvmValue::String(_) => "string",
            JvmValue::Field(_) => "field",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            JvmValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i32> for JvmValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for JvmValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// The textual form used by `println`.
impl Display for JvmValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JvmValue::Int(value) => write!(f, "{}", value),
            JvmValue::String(value) => f.write_str(value),
            JvmValue::Field(index) => write!(f, "field {}", index),
        }
    }
}
