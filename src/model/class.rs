use crate::bytecode::{self, DecodingError, Instruction};

use super::{
    class_file::ClassFile,
    constant_pool::{ConstantPool, ConstantPoolError, ConstantPoolIndex},
    method::Method,
};

/// A parsed class. Immutable once built, so it can back any number of interpreter runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    class_file: ClassFile,
    constant_pool: ConstantPool,
    access_flags: u16,
    this_class: ConstantPoolIndex,
    super_class: ConstantPoolIndex,
    interfaces: Vec<ConstantPoolIndex>,
    methods: Vec<Method>,
}

impl Class {
    pub fn new(
        class_file: ClassFile,
        constant_pool: ConstantPool,
        access_flags: u16,
        this_class: ConstantPoolIndex,
        super_class: ConstantPoolIndex,
        interfaces: Vec<ConstantPoolIndex>,
        methods: Vec<Method>,
    ) -> Self {
        Self {
            class_file,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            methods,
        }
    }

    pub fn class_file(&self) -> &ClassFile {
        &self.class_file
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    pub fn interfaces(&self) -> &[ConstantPoolIndex] {
        &self.interfaces
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn name(&self) -> Result<&'_ str, ConstantPoolError> {
        self.constant_pool.get_class_name(self.this_class)
    }

    pub fn super_name(&self) -> Result<&'_ str, ConstantPoolError> {
        self.constant_pool.get_class_name(self.super_class)
    }

    pub fn method_name(&self, method: &Method) -> Result<&'_ str, ConstantPoolError> {
        self.constant_pool.get_utf8(method.name_index)
    }

    pub fn method_descriptor(&self, method: &Method) -> Result<&'_ str, ConstantPoolError> {
        self.constant_pool.get_utf8(method.descriptor_index)
    }

    /// Returns the first method with the given name. Overloads are not told apart.
    pub fn find_method(&self, name: &str) -> Option<&'_ Method> {
        self.methods
            .iter()
            .find(|method| self.method_name(method).map_or(false, |n| n == name))
    }

    /// Looks a method up by name and decodes its bytecode.
    pub fn find_instructions(&self, name: &str) -> Result<Vec<Instruction>, MethodError> {
        let method = self
            .find_method(name)
            .ok_or_else(|| MethodError::NotFound(name.to_string()))?;
        Ok(bytecode::decode(&method.code)?)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MethodError {
    #[error("there is no method named '{0}'")]
    NotFound(String),

    #[error("could not decode method")]
    Decoding {
        #[from]
        source: DecodingError,
    },
}
