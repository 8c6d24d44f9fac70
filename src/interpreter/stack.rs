use std::fmt::Debug;

use crate::model::value::JvmValue;

use super::ExecutionError;

/// The operand stack of a single frame.
pub struct InterpreterStack {
    stack: Vec<JvmValue>,
}

impl InterpreterStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[inline]
    pub fn push(&mut self, value: JvmValue) {
        self.stack.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Result<JvmValue, ExecutionError> {
        self.stack.pop().ok_or(ExecutionError::EmptyStack)
    }

    #[inline]
    pub fn pop_int(&mut self) -> Result<i32, ExecutionError> {
        let value = self.pop()?;
        value.as_int().ok_or(ExecutionError::TypeMismatch {
            expected: "int",
            found: value.type_name(),
        })
    }

    /// Removes the topmost `count` values, keeping them in push order.
    #[inline]
    pub fn pop_parameters(&mut self, count: usize) -> Result<Vec<JvmValue>, ExecutionError> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(ExecutionError::EmptyStack)?;
        Ok(self.stack.drain(start..).collect())
    }
}

impl Debug for InterpreterStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.stack.iter().rev()).finish()
    }
}
