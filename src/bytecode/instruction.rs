use std::fmt::Display;

use crate::model::constant_pool::ConstantPoolIndex;

/// Position of an instruction inside a decoded method, not a byte offset.
pub type InstructionIndex = usize;

/// A decoded instruction. `T` is the branch target: a signed byte offset relative to the
/// branching instruction straight after the linear decode, an [`InstructionIndex`] once
/// resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<T = InstructionIndex> {
    GetStatic(ConstantPoolIndex),
    Ldc(ConstantPoolIndex),
    InvokeVirtual(ConstantPoolIndex),
    InvokeStatic(ConstantPoolIndex),
    Return,
    IReturn,
    Push(i32),
    Arithmetic(ArithmeticOp),
    IStore(u8),
    ILoad(u8),
    IInc { index: u8, delta: i8 },
    IfNe(T),
    IfICmp(Comparison, T),
    Goto(T),
}

impl<T> Instruction<T> {
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::IfNe(_) | Self::IfICmp(..) | Self::Goto(_))
    }

    /// Swaps the branch target, leaving every other instruction untouched.
    pub fn map_target<U, E>(
        self,
        resolve: impl FnOnce(T) -> Result<U, E>,
    ) -> Result<Instruction<U>, E> {
        Ok(match self {
            Self::GetStatic(index) => Instruction::GetStatic(index),
            Self::Ldc(index) => Instruction::Ldc(index),
            Self::InvokeVirtual(index) => Instruction::InvokeVirtual(index),
            Self::InvokeStatic(index) => Instruction::InvokeStatic(index),
            Self::Return => Instruction::Return,
            Self::IReturn => Instruction::IReturn,
            Self::Push(value) => Instruction::Push(value),
            Self::Arithmetic(op) => Instruction::Arithmetic(op),
            Self::IStore(index) => Instruction::IStore(index),
            Self::ILoad(index) => Instruction::ILoad(index),
            Self::IInc { index, delta } => Instruction::IInc { index, delta },
            Self::IfNe(target) => Instruction::IfNe(resolve(target)?),
            Self::IfICmp(comparison, target) => Instruction::IfICmp(comparison, resolve(target)?),
            Self::Goto(target) => Instruction::Goto(resolve(target)?),
        })
    }
}

impl<T: Display> Display for Instruction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetStatic(index) => write!(f, "getstatic {}", index),
            Self::Ldc(index) => write!(f, "ldc {}", index),
            Self::InvokeVirtual(index) => write!(f, "invokevirtual {}", index),
            Self::InvokeStatic(index) => write!(f, "invokestatic {}", index),
            Self::Return => write!(f, "return"),
            Self::IReturn => write!(f, "ireturn"),
            Self::Push(value) => write!(f, "push {}", value),
            Self::Arithmetic(op) => write!(f, "{}", op),
            Self::IStore(index) => write!(f, "istore_{}", index),
            Self::ILoad(index) => write!(f, "iload_{}", index),
            Self::IInc { index, delta } => write!(f, "iinc {} {}", index, delta),
            Self::IfNe(target) => write!(f, "ifne {}", target),
            Self::IfICmp(comparison, target) => write!(f, "{} {}", comparison, target),
            Self::Goto(target) => write!(f, "goto {}", target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Rem,
}

impl ArithmeticOp {
    /// Two's complement arithmetic; `None` on a remainder by zero.
    pub fn apply(self, value1: i32, value2: i32) -> Option<i32> {
        match self {
            Self::Add => Some(value1.wrapping_add(value2)),
            Self::Sub => Some(value1.wrapping_sub(value2)),
            Self::Mul => Some(value1.wrapping_mul(value2)),
            Self::Rem => (value2 != 0).then(|| value1.wrapping_rem(value2)),
        }
    }
}

impl Display for ArithmeticOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "iadd"),
            Self::Sub => write!(f, "isub"),
            Self::Mul => write!(f, "imul"),
            Self::Rem => write!(f, "irem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterOrEqual,
    Greater,
}

impl Comparison {
    pub fn holds(self, value1: i32, value2: i32) -> bool {
        match self {
            Self::GreaterOrEqual => value1 >= value2,
            Self::Greater => value1 > value2,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterOrEqual => write!(f, "if_icmpge"),
            Self::Greater => write!(f, "if_icmpgt"),
        }
    }
}
