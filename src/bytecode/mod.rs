//! Opcodes understood by the interpreter and the decoder turning raw method code into
//! [`Instruction`]s.

mod decoder;
mod instruction;

pub use decoder::{decode, read_raw, DecodingError};
pub use instruction::{ArithmeticOp, Comparison, Instruction, InstructionIndex};

pub const ICONST_M1: u8 = 0x02;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const ICONST_2: u8 = 0x05;
pub const ICONST_3: u8 = 0x06;
pub const ICONST_4: u8 = 0x07;
pub const ICONST_5: u8 = 0x08;
pub const BIPUSH: u8 = 0x10;
pub const LDC: u8 = 0x12;

pub const ILOAD_0: u8 = 0x1a;
pub const ILOAD_1: u8 = 0x1b;
pub const ILOAD_2: u8 = 0x1c;
pub const ISTORE_1: u8 = 0x3c;
pub const ISTORE_2: u8 = 0x3d;

pub const IADD: u8 = 0x60;
pub const ISUB: u8 = 0x64;
pub const IMUL: u8 = 0x68;
pub const IREM: u8 = 0x70;
pub const IINC: u8 = 0x84;

pub const IFNE: u8 = 0x9a;
pub const IF_ICMPGE: u8 = 0xa2;
pub const IF_ICMPGT: u8 = 0xa3;
pub const GOTO: u8 = 0xa7;

pub const IRETURN: u8 = 0xac;
pub const RETURN: u8 = 0xb1;

pub const GETSTATIC: u8 = 0xb2;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESTATIC: u8 = 0xb8;
