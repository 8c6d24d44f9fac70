mod locals;
mod stack;

use std::{collections::HashMap, io::Write, rc::Rc};

pub use locals::InterpreterLocals;
pub use stack::InterpreterStack;

use crate::{
    bytecode::{self, Instruction, InstructionIndex},
    model::{
        class::{Class, MethodError},
        constant_pool::{ConstantPoolError, ConstantPoolIndex},
        types::{MethodDescriptor, TypeError},
        value::JvmValue,
    },
    ErrorKind,
};

/// The receiver and method `invokevirtual` knows how to execute.
const PRINT_STREAM_OWNER: &str = "java/lang/System";
const PRINT_STREAM_FIELD: &str = "out";
const PRINTLN: &str = "println";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Maximum number of nested method invocations, unlimited when `None`.
    pub max_call_depth: Option<usize>,
    /// Minimum number of local variable slots of every frame.
    pub locals_capacity: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_call_depth: None,
            locals_capacity: 10,
        }
    }
}

/// Executes methods of a single class, writing everything `println` prints to `out`.
pub struct Interpreter<'c, W: Write> {
    class: &'c Class,
    out: W,
    options: InterpreterOptions,
    decoded: HashMap<&'c str, Rc<[Instruction]>>,
    depth: usize,
}

impl<'c, W: Write> Interpreter<'c, W> {
    pub fn new(class: &'c Class, out: W) -> Self {
        Self::with_options(class, out, InterpreterOptions::default())
    }

    pub fn with_options(class: &'c Class, out: W, options: InterpreterOptions) -> Self {
        Self {
            class,
            out,
            options,
            decoded: HashMap::new(),
            depth: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the named method with empty locals and returns what it returned, if anything.
    pub fn run(&mut self, method: &str) -> Result<Option<JvmValue>, ExecutionError> {
        let class = self.class;
        let entry = class
            .find_method(method)
            .ok_or_else(|| MethodError::NotFound(method.to_string()))?;
        if !entry.is_static() {
            log::warn!("Entry method {} is not static", method);
        }

        let return_value = self.invoke(class.method_name(entry)?, Vec::new())?;
        self.out.flush()?;
        Ok(return_value)
    }

    fn invoke(
        &mut self,
        name: &'c str,
        arguments: Vec<JvmValue>,
    ) -> Result<Option<JvmValue>, ExecutionError> {
        if let Some(max_call_depth) = self.options.max_call_depth {
            if self.depth >= max_call_depth {
                return Err(ExecutionError::CallDepthExceeded(max_call_depth));
            }
        }

        let (instructions, max_locals) = self.load(name)?;
        let locals = InterpreterLocals::new(
            self.options.locals_capacity.max(max_locals),
            arguments,
        )?;

        log::debug!("Entered method {} at depth {}", name, self.depth);
        self.depth += 1;
        let return_value = self.interpret(&instructions, locals);
        self.depth -= 1;
        log::debug!("Exited method {}", name);

        return_value
    }

    /// Finds a method by name and decodes it, once per interpreter.
    fn load(&mut self, name: &'c str) -> Result<(Rc<[Instruction]>, usize), ExecutionError> {
        let class = self.class;
        let method = class
            .find_method(name)
            .ok_or_else(|| MethodError::NotFound(name.to_string()))?;

        let instructions = match self.decoded.get(name) {
            Some(instructions) => Rc::clone(instructions),
            None => {
                let instructions: Rc<[Instruction]> = bytecode::decode(&method.code)
                    .map_err(MethodError::from)?
                    .into();
                self.decoded.insert(name, Rc::clone(&instructions));
                instructions
            }
        };

        Ok((instructions, method.max_locals))
    }

    fn interpret(
        &mut self,
        instructions: &[Instruction],
        mut locals: InterpreterLocals,
    ) -> Result<Option<JvmValue>, ExecutionError> {
        let class = self.class;
        let constant_pool = class.constant_pool();
        let mut stack = InterpreterStack::new(4);
        let mut pc: InstructionIndex = 0;

        loop {
            let instruction = match instructions.get(pc) {
                Some(instruction) => *instruction,
                None if pc == instructions.len() => {
                    log::warn!("Reached the end of the method without a return");
                    return Ok(None);
                }
                None => return Err(ExecutionError::InvalidProgramCounter(pc)),
            };
            log::trace!("{:>4}: {:<20} {:?}", pc, instruction.to_string(), stack);

            match instruction {
                Instruction::GetStatic(index) => {
                    constant_pool.get_field_reference(index)?;
                    stack.push(JvmValue::Field(index));
                }
                Instruction::Ldc(index) => {
                    let text = constant_pool.get_string(index)?;
                    stack.push(JvmValue::String(text.to_string()));
                }
                Instruction::InvokeVirtual(index) => self.invoke_virtual(index, &mut stack)?,
                Instruction::InvokeStatic(index) => self.invoke_static(index, &mut stack)?,
                Instruction::Return => return Ok(None),
                Instruction::IReturn => return Ok(Some(stack.pop()?)),
                Instruction::Push(value) => stack.push(JvmValue::Int(value)),
                Instruction::Arithmetic(op) => {
                    let value2 = stack.pop_int()?;
                    let value1 = stack.pop_int()?;
                    let result = op
                        .apply(value1, value2)
                        .ok_or(ExecutionError::DivisionByZero)?;
                    stack.push(JvmValue::Int(result));
                }
                Instruction::IStore(index) => {
                    let value = stack.pop()?;
                    locals.set(index, value)?;
                }
                Instruction::ILoad(index) => stack.push(locals.get(index)?),
                Instruction::IInc { index, delta } => locals.increment(index, delta as i32)?,
                Instruction::IfNe(target) => {
                    if stack.pop_int()? != 0 {
                        pc = target;
                        continue;
                    }
                }
                Instruction::IfICmp(comparison, target) => {
                    let value2 = stack.pop_int()?;
                    let value1 = stack.pop_int()?;
                    if comparison.holds(value1, value2) {
                        pc = target;
                        continue;
                    }
                }
                Instruction::Goto(target) => {
                    pc = target;
                    continue;
                }
            }

            pc += 1;
        }
    }

    fn invoke_virtual(
        &mut self,
        index: ConstantPoolIndex,
        stack: &mut InterpreterStack,
    ) -> Result<(), ExecutionError> {
        let class = self.class;
        let constant_pool = class.constant_pool();
        let method = constant_pool.resolve_member(constant_pool.get_method_reference(index)?)?;

        // Only single argument calls are understood
        let descriptor = MethodDescriptor::parse(method.descriptor)?;
        if descriptor.argument_count() != 1 {
            return Err(ExecutionError::NotUnary(method.to_string()));
        }

        let argument = stack.pop()?;
        let receiver = match stack.pop()? {
            JvmValue::Field(field) => field,
            other => {
                return Err(ExecutionError::TypeMismatch {
                    expected: "field",
                    found: other.type_name(),
                })
            }
        };
        let field = constant_pool.resolve_member(constant_pool.get_field_reference(receiver)?)?;

        if field.class == PRINT_STREAM_OWNER
            && field.name == PRINT_STREAM_FIELD
            && method.name == PRINTLN
        {
            writeln!(self.out, "{}", argument)?;
            Ok(())
        } else {
            Err(ExecutionError::UnsupportedVirtualCall(format!(
                "{} on {}.{}",
                method, field.class, field.name
            )))
        }
    }

    fn invoke_static(
        &mut self,
        index: ConstantPoolIndex,
        stack: &mut InterpreterStack,
    ) -> Result<(), ExecutionError> {
        let class = self.class;
        let constant_pool = class.constant_pool();
        let method = constant_pool.resolve_member(constant_pool.get_method_reference(index)?)?;
        if method.class != class.name()? {
            return Err(ExecutionError::UnsupportedStaticCall(method.to_string()));
        }

        let descriptor = MethodDescriptor::parse(method.descriptor)?;
        let arguments = stack.pop_parameters(descriptor.argument_count())?;

        if let Some(return_value) = self.invoke(method.name, arguments)? {
            stack.push(return_value);
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("pop from an empty operand stack")]
    EmptyStack,

    #[error("expected a value of type {expected}, but got a {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("local variable {0} is read before it is written")]
    UninitializedLocal(u8),

    #[error("local variable {0} is outside of the {1} available slots")]
    LocalOutOfRange(u8, usize),

    #[error("{count} arguments do not fit in {capacity} local variable slots")]
    TooManyArguments { count: usize, capacity: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("program counter {0} is outside of the method")]
    InvalidProgramCounter(usize),

    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error("only System.out.println is supported, not {0}")]
    UnsupportedVirtualCall(String),

    #[error("static calls into other classes are not supported: {0}")]
    UnsupportedStaticCall(String),

    #[error("virtual calls take exactly one argument: {0}")]
    NotUnary(String),

    #[error("method error")]
    Method {
        #[from]
        source: MethodError,
    },

    #[error("constant pool error")]
    ConstantPool {
        #[from]
        source: ConstantPoolError,
    },

    #[error("type error")]
    Type {
        #[from]
        source: TypeError,
    },

    #[error("could not write output")]
    Output {
        #[from]
        source: std::io::Error,
    },
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Method {
                source: MethodError::Decoding { .. },
            }
            | Self::ConstantPool { .. }
            | Self::Type { .. }
            | Self::InvalidProgramCounter(_) => ErrorKind::MalformedInput,

            Self::TooManyArguments { .. } | Self::NotUnary(_) => ErrorKind::StructuralAssumption,

            Self::Output { .. } => ErrorKind::Io,

            Self::EmptyStack
            | Self::TypeMismatch { .. }
            | Self::UninitializedLocal(_)
            | Self::LocalOutOfRange(..)
            | Self::DivisionByZero
            | Self::CallDepthExceeded(_)
            | Self::UnsupportedVirtualCall(_)
            | Self::UnsupportedStaticCall(_)
            | Self::Method {
                source: MethodError::NotFound(_),
            } => ErrorKind::UnsupportedOperation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        class_file::ClassFile,
        constant_pool::{ConstantPool, ConstantPoolEntry, MemberReference},
        method::{Method, MethodAccessFlags},
    };

    fn utf8(text: &str) -> ConstantPoolEntry {
        ConstantPoolEntry::Utf8(text.to_string())
    }

    fn member(class: u16, name_and_type: u16) -> MemberReference {
        MemberReference {
            class: class.into(),
            name_and_type: name_and_type.into(),
        }
    }

    fn name_and_type(name: u16, ty: u16) -> ConstantPoolEntry {
        ConstantPoolEntry::NameAndType {
            name: name.into(),
            ty: ty.into(),
        }
    }

    fn method(name: u16, descriptor: u16, code: &[u8]) -> Method {
        Method {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            name_index: name.into(),
            descriptor_index: descriptor.into(),
            max_stack: 4,
            max_locals: 2,
            code: code.to_vec(),
        }
    }

    /// `Test` with `main` and `add(II)I`. Field #8 is System.out, method #14 println,
    /// #16 the string "Hello World!", #22 Test.add and #25 PrintStream.print.
    fn class(main: &[u8], add: &[u8]) -> Class {
        let constant_pool = ConstantPool::new(vec![
            utf8("Test"),
            ConstantPoolEntry::Class { name: 1u16.into() },
            utf8("java/lang/System"),
            ConstantPoolEntry::Class { name: 3u16.into() },
            utf8("out"),
            utf8("Ljava/io/PrintStream;"),
            name_and_type(5, 6),
            ConstantPoolEntry::FieldReference(member(4, 7)),
            utf8("java/io/PrintStream"),
            ConstantPoolEntry::Class { name: 9u16.into() },
            utf8("println"),
            utf8("(Ljava/lang/Object;)V"),
            name_and_type(11, 12),
            ConstantPoolEntry::MethodReference(member(10, 13)),
            utf8("Hello World!"),
            ConstantPoolEntry::String {
                string: 15u16.into(),
            },
            utf8("main"),
            utf8("([Ljava/lang/String;)V"),
            utf8("add"),
            utf8("(II)I"),
            name_and_type(19, 20),
            ConstantPoolEntry::MethodReference(member(2, 21)),
            utf8("print"),
            name_and_type(23, 12),
            ConstantPoolEntry::MethodReference(member(10, 24)),
        ]);

        Class::new(
            ClassFile::new(0, 52),
            constant_pool,
            0x0021,
            2u16.into(),
            2u16.into(),
            Vec::new(),
            vec![method(17, 18, main), method(19, 20, add)],
        )
    }

    const ADD: &[u8] = &[0x1a, 0x1b, 0x60, 0xac];

    fn output(class: &Class) -> Result<String, ExecutionError> {
        let mut interpreter = Interpreter::new(class, Vec::new());
        interpreter.run("main")?;
        Ok(String::from_utf8(interpreter.into_output()).unwrap())
    }

    #[test]
    fn prints_hello_world() {
        let class = class(&[0xb2, 0, 8, 0x12, 16, 0xb6, 0, 14, 0xb1], ADD);
        assert_eq!(output(&class).unwrap(), "Hello World!\n");
    }

    #[test]
    fn counts_up_in_a_loop() {
        #[rustfmt::skip]
        let main = [
            0x03, 0x3c,             // i = 0
            0x1b, 0x08,             // 2: i, 5
            0xa2, 0x00, 0x10,       // 4: if_icmpge +16 (-> 20)
            0xb2, 0x00, 0x08,       // System.out
            0x1b,                   // i
            0xb6, 0x00, 0x0e,       // println
            0x84, 0x01, 0x01,       // i++
            0xa7, 0xff, 0xf1,       // 17: goto -15 (-> 2)
            0xb1,                   // 20: return
        ];
        assert_eq!(output(&class(&main, ADD)).unwrap(), "0\n1\n2\n3\n4\n");
    }

    #[test]
    fn static_call_returns_value() {
        let main = [0xb2, 0, 8, 0x04, 0x05, 0xb8, 0, 22, 0xb6, 0, 14, 0xb1];
        assert_eq!(output(&class(&main, ADD)).unwrap(), "3\n");
    }

    #[test]
    fn run_returns_the_entry_result() {
        let class = class(&[0xb1], &[0x10, 42, 0xac]);
        let mut interpreter = Interpreter::new(&class, Vec::new());
        assert_eq!(interpreter.run("add").unwrap(), Some(JvmValue::Int(42)));
        assert_eq!(interpreter.run("main").unwrap(), None);
        assert!(interpreter.into_output().is_empty());
    }

    #[test]
    fn repeated_runs_print_the_same() {
        let class = class(&[0xb2, 0, 8, 0x12, 16, 0xb6, 0, 14, 0xb1], ADD);
        assert_eq!(output(&class).unwrap(), output(&class).unwrap());
    }

    #[test]
    fn only_println_is_supported() {
        let class = class(&[0xb2, 0, 8, 0x12, 16, 0xb6, 0, 25, 0xb1], ADD);
        let err = output(&class).unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedVirtualCall(_)));
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn remainder_by_zero_fails() {
        let class = class(&[0x04, 0x03, 0x70, 0xac], ADD);
        let err = output(&class).unwrap_err();
        assert!(matches!(err, ExecutionError::DivisionByZero));
    }

    #[test]
    fn empty_stack_fails() {
        let class = class(&[0x60, 0xb1], ADD);
        assert!(matches!(
            output(&class).unwrap_err(),
            ExecutionError::EmptyStack
        ));
    }

    #[test]
    fn falling_off_the_end_returns_nothing() {
        let class = class(&[0x04, 0x3c], ADD);
        assert_eq!(output(&class).unwrap(), "");
    }

    #[test]
    fn call_depth_is_limited() {
        let main = [0x04, 0x05, 0xb8, 0, 22, 0xac];
        let class = class(&main, ADD);
        let options = InterpreterOptions {
            max_call_depth: Some(1),
            ..InterpreterOptions::default()
        };
        let mut interpreter = Interpreter::with_options(&class, Vec::new(), options);
        assert!(matches!(
            interpreter.run("main"),
            Err(ExecutionError::CallDepthExceeded(1))
        ));
    }

    #[test]
    fn unknown_methods_are_unsupported() {
        let class = class(&[0xb1], ADD);
        let err = Interpreter::new(&class, Vec::new()).run("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn undecodable_methods_are_malformed() {
        let class = class(&[0xff], ADD);
        let err = output(&class).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
