use crate::model::value::JvmValue;

use super::ExecutionError;

/// Local variable slots of a frame. Slots stay empty until first stored to.
#[derive(Debug)]
pub struct InterpreterLocals {
    locals: Vec<Option<JvmValue>>,
}

impl InterpreterLocals {
    /// Places the parameters in slots `0..n`, the remaining slots start out empty.
    pub fn new(capacity: usize, parameters: Vec<JvmValue>) -> Result<Self, ExecutionError> {
        if parameters.len() > capacity {
            return Err(ExecutionError::TooManyArguments {
                count: parameters.len(),
                capacity,
            });
        }

        let mut locals: Vec<Option<JvmValue>> = parameters.into_iter().map(Some).collect();
        locals.resize(capacity, None);

        Ok(Self { locals })
    }

    pub fn capacity(&self) -> usize {
        self.locals.len()
    }

    pub fn get(&self, index: u8) -> Result<JvmValue, ExecutionError> {
        self.slot(index)?
            .clone()
            .ok_or(ExecutionError::UninitializedLocal(index))
    }

    pub fn set(&mut self, index: u8, value: JvmValue) -> Result<(), ExecutionError> {
        *self.slot_mut(index)? = Some(value);
        Ok(())
    }

    pub fn increment(&mut self, index: u8, delta: i32) -> Result<(), ExecutionError> {
        match self.slot_mut(index)? {
            Some(JvmValue::Int(value)) => {
                *value = value.wrapping_add(delta);
                Ok(())
            }
            Some(other) => Err(ExecutionError::TypeMismatch {
                expected: "int",
                found: other.type_name(),
            }),
            None => Err(ExecutionError::UninitializedLocal(index)),
        }
    }

    fn slot(&self, index: u8) -> Result<&Option<JvmValue>, ExecutionError> {
        self.locals
            .get(index as usize)
            .ok_or(ExecutionError::LocalOutOfRange(index, self.locals.len()))
    }

    fn slot_mut(&mut self, index: u8) -> Result<&mut Option<JvmValue>, ExecutionError> {
        let capacity = self.locals.len();
        self.locals
            .get_mut(index as usize)
            .ok_or(ExecutionError::LocalOutOfRange(index, capacity))
    }
}
