use crate::class_parser::{iterator::ClassFileIterator, UnexpectedEof};

use super::{ArithmeticOp, Comparison, Instruction};

/// Decodes a method's code and resolves every branch to the index of its target instruction.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>, DecodingError> {
    let (instructions, positions) = read_raw(code)?;
    resolve(instructions, &positions)
}

/// Linear decode. Returns the instructions with unresolved branch offsets alongside the
/// byte offset each instruction starts at.
pub fn read_raw(code: &[u8]) -> Result<(Vec<Instruction<i16>>, Vec<usize>), DecodingError> {
    let mut iter = ClassFileIterator::new(code);
    let mut instructions = Vec::new();
    let mut positions = Vec::new();

    while !iter.is_empty() {
        let position = iter.offset();
        let instruction = read_instruction(&mut iter, position)?;
        log::trace!("{:>5}: {}", position, instruction);
        positions.push(position);
        instructions.push(instruction);
    }

    Ok((instructions, positions))
}

fn read_instruction(
    iter: &mut ClassFileIterator,
    position: usize,
) -> Result<Instruction<i16>, DecodingError> {
    use super::*;

    let opcode = iter.byte()?;
    let instruction = match opcode {
        GETSTATIC => Instruction::GetStatic(iter.u16()?.into()),
        LDC => Instruction::Ldc(iter.byte()?.into()),
        INVOKEVIRTUAL => Instruction::InvokeVirtual(iter.u16()?.into()),
        INVOKESTATIC => Instruction::InvokeStatic(iter.u16()?.into()),
        RETURN => Instruction::Return,
        IRETURN => Instruction::IReturn,

        ICONST_M1 => Instruction::Push(-1),
        ICONST_0 => Instruction::Push(0),
        ICONST_1 => Instruction::Push(1),
        ICONST_2 => Instruction::Push(2),
        ICONST_3 => Instruction::Push(3),
        ICONST_4 => Instruction::Push(4),
        ICONST_5 => Instruction::Push(5),
        BIPUSH => Instruction::Push(iter.i8()? as i32),

        IADD => Instruction::Arithmetic(ArithmeticOp::Add),
        ISUB => Instruction::Arithmetic(ArithmeticOp::Sub),
        IMUL => Instruction::Arithmetic(ArithmeticOp::Mul),
        IREM => Instruction::Arithmetic(ArithmeticOp::Rem),

        ISTORE_1 => Instruction::IStore(1),
        ISTORE_2 => Instruction::IStore(2),
        ILOAD_0 => Instruction::ILoad(0),
        ILOAD_1 => Instruction::ILoad(1),
        ILOAD_2 => Instruction::ILoad(2),
        IINC => Instruction::IInc {
            index: iter.byte()?,
            delta: iter.i8()?,
        },

        IFNE => Instruction::IfNe(iter.i16()?),
        IF_ICMPGE => Instruction::IfICmp(Comparison::GreaterOrEqual, iter.i16()?),
        IF_ICMPGT => Instruction::IfICmp(Comparison::Greater, iter.i16()?),
        GOTO => Instruction::Goto(iter.i16()?),

        _ => return Err(DecodingError::UnsupportedOpcode { opcode, position }),
    };
    Ok(instruction)
}

/// Turns the byte offset of every branch into the index of the instruction starting exactly
/// at `position + offset`.
fn resolve(
    instructions: Vec<Instruction<i16>>,
    positions: &[usize],
) -> Result<Vec<Instruction>, DecodingError> {
    instructions
        .into_iter()
        .zip(positions)
        .map(|(instruction, &position)| {
            instruction.map_target(|offset| {
                let target = position as i64 + offset as i64;
                usize::try_from(target)
                    .ok()
                    .and_then(|target| positions.binary_search(&target).ok())
                    .ok_or(DecodingError::InvalidBranchTarget { position, target })
            })
        })
        .collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("truncated instruction")]
    Truncated {
        #[from]
        source: UnexpectedEof,
    },

    #[error("unsupported opcode {opcode:#04x} at offset {position}")]
    UnsupportedOpcode { opcode: u8, position: usize },

    #[error("branch at offset {position} targets offset {target}, which does not start an instruction")]
    InvalidBranchTarget { position: usize, target: i64 },
}
