//! A tiny interpreter for single class files: parses the class, decodes the bytecode of the
//! requested method and runs it, writing whatever `System.out.println` prints.

pub mod bytecode;
pub mod class_loader;
pub mod class_parser;
pub mod interpreter;
pub mod model;

use std::io::Write;

use crate::{
    class_parser::ParsingError,
    interpreter::{ExecutionError, Interpreter, InterpreterOptions},
    model::value::JvmValue,
};

/// Broad classification of every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The class file or its bytecode is broken or uses unsupported constructs.
    MalformedInput,
    /// The program asks for something the interpreter does not do.
    UnsupportedOperation,
    /// A call does not fit the fixed calling convention.
    StructuralAssumption,
    Io,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not parse class file: {0}")]
    Parsing(#[from] ParsingError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("could not load class: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parsing(_) => ErrorKind::MalformedInput,
            Error::Execution(err) => err.kind(),
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

/// Parses `bytes` and runs `method` with the default options.
pub fn run<W: Write>(bytes: &[u8], method: &str, out: W) -> Result<Option<JvmValue>, Error> {
    run_with_options(bytes, method, out, InterpreterOptions::default())
}

pub fn run_with_options<W: Write>(
    bytes: &[u8],
    method: &str,
    out: W,
    options: InterpreterOptions,
) -> Result<Option<JvmValue>, Error> {
    let class = class_parser::parse(bytes)?;
    let mut interpreter = Interpreter::with_options(&class, out, options);
    Ok(interpreter.run(method)?)
}
