//! Assembles class files for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use byteorder::{BigEndian, WriteBytesExt};

pub use toyjvm::bytecode::*;

pub const SYSTEM: &str = "java/lang/System";
pub const PRINT_STREAM: &str = "java/io/PrintStream";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(String),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    NameAndType(u16, u16),
    /// Any tag with raw payload, for malformed pools.
    Raw(u8, Vec<u8>),
}

struct MethodEntry {
    name: u16,
    descriptor: u16,
    max_locals: u16,
    code: Vec<u8>,
}

pub struct ClassBuilder {
    name: String,
    constants: Vec<Constant>,
    lookup: HashMap<Constant, u16>,
    methods: Vec<MethodEntry>,
    field_count: u16,
    trailing: Vec<u8>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            constants: Vec::new(),
            lookup: HashMap::new(),
            methods: Vec::new(),
            field_count: 0,
            trailing: Vec::new(),
        }
    }

    /// Adds a constant, reusing an identical one when present. Returns its 1-based index.
    pub fn constant(&mut self, constant: Constant) -> u16 {
        if let Some(index) = self.lookup.get(&constant) {
            return *index;
        }
        self.constants.push(constant.clone());
        let index = self.constants.len() as u16;
        self.lookup.insert(constant, index);
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        self.constant(Constant::Utf8(text.to_string()))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.constant(Constant::Class(name))
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let text = self.utf8(text);
        self.constant(Constant::String(text))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.constant(Constant::NameAndType(name, descriptor))
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.constant(Constant::FieldRef(class, name_and_type))
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, descriptor);
        self.constant(Constant::MethodRef(class, name_and_type))
    }

    pub fn system_out(&mut self) -> u16 {
        self.field_ref(SYSTEM, "out", "Ljava/io/PrintStream;")
    }

    pub fn println(&mut self, descriptor: &str) -> u16 {
        self.method_ref(PRINT_STREAM, "println", descriptor)
    }

    /// A static method of the class being built.
    pub fn own_method(&mut self, name: &str, descriptor: &str) -> u16 {
        let this = self.name.clone();
        self.method_ref(&this, name, descriptor)
    }

    pub fn method(&mut self, name: &str, descriptor: &str, code: Vec<u8>) -> &mut Self {
        self.method_with_locals(name, descriptor, 4, code)
    }

    pub fn method_with_locals(
        &mut self,
        name: &str,
        descriptor: &str,
        max_locals: u16,
        code: Vec<u8>,
    ) -> &mut Self {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.methods.push(MethodEntry {
            name,
            descriptor,
            max_locals,
            code,
        });
        self
    }

    pub fn field_count(&mut self, count: u16) -> &mut Self {
        self.field_count = count;
        self
    }

    pub fn trailing(&mut self, bytes: &[u8]) -> &mut Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        let this = self.class(&self.name.clone());
        let object = self.class("java/lang/Object");
        let code = self.utf8("Code");
        let source_file = self.utf8("SourceFile");
        let source_name = self.utf8(&format!("{}.java", self.name));

        let mut out = Vec::new();
        out.write_u32::<BigEndian>(0xCAFEBABE).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(52).unwrap();

        out.write_u16::<BigEndian>(self.constants.len() as u16 + 1)
            .unwrap();
        for constant in &self.constants {
            write_constant(&mut out, constant);
        }

        out.write_u16::<BigEndian>(0x0021).unwrap();
        out.write_u16::<BigEndian>(this).unwrap();
        out.write_u16::<BigEndian>(object).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(self.field_count).unwrap();

        out.write_u16::<BigEndian>(self.methods.len() as u16)
            .unwrap();
        for method in &self.methods {
            out.write_u16::<BigEndian>(0x0009).unwrap();
            out.write_u16::<BigEndian>(method.name).unwrap();
            out.write_u16::<BigEndian>(method.descriptor).unwrap();
            out.write_u16::<BigEndian>(1).unwrap();

            // Code attribute with an empty exception table and no nested attributes
            out.write_u16::<BigEndian>(code).unwrap();
            out.write_u32::<BigEndian>(12 + method.code.len() as u32)
                .unwrap();
            out.write_u16::<BigEndian>(8).unwrap();
            out.write_u16::<BigEndian>(method.max_locals).unwrap();
            out.write_u32::<BigEndian>(method.code.len() as u32)
                .unwrap();
            out.extend_from_slice(&method.code);
            out.write_u16::<BigEndian>(0).unwrap();
            out.write_u16::<BigEndian>(0).unwrap();
        }

        // SourceFile attribute
        out.write_u16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(source_file).unwrap();
        out.write_u32::<BigEndian>(2).unwrap();
        out.write_u16::<BigEndian>(source_name).unwrap();

        out.extend_from_slice(&self.trailing);
        out
    }
}

fn write_constant(out: &mut Vec<u8>, constant: &Constant) {
    match constant {
        Constant::Utf8(text) => {
            out.write_u8(1).unwrap();
            out.write_u16::<BigEndian>(text.len() as u16).unwrap();
            out.extend_from_slice(text.as_bytes());
        }
        Constant::Class(name) => {
            out.write_u8(7).unwrap();
            out.write_u16::<BigEndian>(*name).unwrap();
        }
        Constant::String(text) => {
            out.write_u8(8).unwrap();
            out.write_u16::<BigEndian>(*text).unwrap();
        }
        Constant::FieldRef(class, name_and_type) => {
            out.write_u8(9).unwrap();
            out.write_u16::<BigEndian>(*class).unwrap();
            out.write_u16::<BigEndian>(*name_and_type).unwrap();
        }
        Constant::MethodRef(class, name_and_type) => {
            out.write_u8(10).unwrap();
            out.write_u16::<BigEndian>(*class).unwrap();
            out.write_u16::<BigEndian>(*name_and_type).unwrap();
        }
        Constant::NameAndType(name, descriptor) => {
            out.write_u8(12).unwrap();
            out.write_u16::<BigEndian>(*name).unwrap();
            out.write_u16::<BigEndian>(*descriptor).unwrap();
        }
        Constant::Raw(tag, payload) => {
            out.write_u8(*tag).unwrap();
            out.extend_from_slice(payload);
        }
    }
}

/// Method bytecode with named branch targets.
#[derive(Default)]
pub struct Code {
    bytes: Vec<u8>,
    labels: HashMap<&'static str, usize>,
    // (start of the branch instruction, position of its operand, target label)
    fixups: Vec<(usize, usize, &'static str)>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(&mut self, opcode: u8) -> &mut Self {
        self.bytes.push(opcode);
        self
    }

    pub fn op_u8(&mut self, opcode: u8, operand: u8) -> &mut Self {
        self.bytes.push(opcode);
        self.bytes.push(operand);
        self
    }

    pub fn op_u16(&mut self, opcode: u8, operand: u16) -> &mut Self {
        self.bytes.push(opcode);
        self.bytes.write_u16::<BigEndian>(operand).unwrap();
        self
    }

    pub fn bipush(&mut self, value: i8) -> &mut Self {
        self.bytes.push(BIPUSH);
        self.bytes.write_i8(value).unwrap();
        self
    }

    pub fn iinc(&mut self, index: u8, delta: i8) -> &mut Self {
        self.bytes.push(IINC);
        self.bytes.push(index);
        self.bytes.write_i8(delta).unwrap();
        self
    }

    pub fn label(&mut self, name: &'static str) -> &mut Self {
        self.labels.insert(name, self.bytes.len());
        self
    }

    pub fn branch(&mut self, opcode: u8, label: &'static str) -> &mut Self {
        let start = self.bytes.len();
        self.bytes.push(opcode);
        self.fixups.push((start, self.bytes.len(), label));
        self.bytes.extend_from_slice(&[0, 0]);
        self
    }

    /// Prints the value on top of the stack, which has to sit above `System.out`.
    pub fn println(&mut self, method: u16) -> &mut Self {
        self.op_u16(INVOKEVIRTUAL, method)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        let mut bytes = self.bytes.clone();
        for (start, operand, label) in &self.fixups {
            let target = self.labels[label];
            let offset = (target as i64 - *start as i64) as i16;
            bytes[*operand..*operand + 2].copy_from_slice(&offset.to_be_bytes());
        }
        bytes
    }
}

/// Runs `main` and returns everything it printed.
pub fn run_main(class: &[u8]) -> Result<String, toyjvm::Error> {
    let mut out = Vec::new();
    toyjvm::run(class, "main", &mut out)?;
    Ok(String::from_utf8(out).expect("output is valid UTF-8"))
}

pub fn lines(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("{}\n", line)).collect()
}
