use bitflags::bitflags;

use super::constant_pool::ConstantPoolIndex;

bitflags! {
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

/// A method as it appears in the class file. The bytecode is kept verbatim and only
/// decoded when the method is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub access_flags: MethodAccessFlags,
    pub name_index: ConstantPoolIndex,
    pub descriptor_index: ConstantPoolIndex,
    pub max_stack: usize,
    pub max_locals: usize,
    pub code: Vec<u8>,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }
}
