mod attribute;
pub(crate) mod iterator;

use std::str::Utf8Error;

pub use iterator::UnexpectedEof;

use crate::{
    class_parser::iterator::ClassFileIterator,
    model::{
        class::Class,
        class_file::{ClassFile, MAGIC},
        constant_pool::{
            ConstantPool, ConstantPoolEntry, ConstantPoolError, ConstantPoolIndex, MemberReference,
        },
        method::{Method, MethodAccessFlags},
    },
};

/// Parses a complete class file. The whole buffer has to be consumed.
pub fn parse(bytes: &[u8]) -> Result<Class, ParsingError> {
    let mut iter = ClassFileIterator::new(bytes);

    // Magic number
    let magic = iter.u32()?;
    if magic != MAGIC {
        return Err(ParsingError::MissingMagicNumber(magic));
    }

    // Version info, never checked
    let minor_version = iter.u16()?;
    let major_version = iter.u16()?;
    log::debug!("Class file version {}.{}", major_version, minor_version);

    // Constant pool
    let constant_pool = parse_constants(&mut iter)?;

    let access_flags = iter.u16()?;
    log::debug!("Access flags {:#06x}", access_flags);

    // This
    let this_class: ConstantPoolIndex = iter.u16()?.into();
    let name = constant_pool.get_class_name(this_class)?;
    log::debug!("This class {}", name);

    // Super
    let super_class: ConstantPoolIndex = iter.u16()?.into();

    // Interfaces
    let interface_count = iter.u16()? as usize;
    let mut interfaces: Vec<ConstantPoolIndex> = Vec::with_capacity(interface_count);
    for _ in 0..interface_count {
        interfaces.push(iter.u16()?.into());
    }
    log::debug!("Read {} interfaces", interface_count);

    // Fields
    let field_count = iter.u16()?;
    if field_count != 0 {
        return Err(ParsingError::UnsupportedFields(field_count));
    }

    // Methods
    let methods = parse_methods(&mut iter, &constant_pool)?;

    // Attributes
    skip_attributes(&mut iter, &constant_pool)?;

    if !iter.is_empty() {
        return Err(ParsingError::TrailingBytes(iter.remaining()));
    }

    Ok(Class::new(
        ClassFile::new(minor_version, major_version),
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        methods,
    ))
}

fn parse_constants(iter: &mut ClassFileIterator) -> Result<ConstantPool, ParsingError> {
    // The count in the class file is the size of the constant pool plus one
    let declared = iter.u16()?;
    let count = declared
        .checked_sub(1)
        .ok_or(ParsingError::InvalidConstantPoolCount(declared))?;
    log::debug!("Reading {} constants", count);

    let mut constants = Vec::with_capacity(count as usize);

    for i in 1..=count {
        let tag = iter.byte()?;
        let entry = match tag {
            // CONSTANT_Utf8
            1 => {
                let length = iter.u16()? as usize;
                let text = std::str::from_utf8(iter.take_bytes(length)?)
                    .map_err(|err| ParsingError::InvalidUtf8Constant(i, err))?;
                ConstantPoolEntry::Utf8(text.to_string())
            }

            // CONSTANT_Class
            7 => ConstantPoolEntry::Class {
                name: read_index(iter, declared)?,
            },

            // CONSTANT_String
            8 => ConstantPoolEntry::String {
                string: read_index(iter, declared)?,
            },

            // CONSTANT_Fieldref
            9 => ConstantPoolEntry::FieldReference(read_member(iter, declared)?),

            // CONSTANT_Methodref
            10 => ConstantPoolEntry::MethodReference(read_member(iter, declared)?),

            // CONSTANT_NameAndType
            12 => ConstantPoolEntry::NameAndType {
                name: read_index(iter, declared)?,
                ty: read_index(iter, declared)?,
            },

            _ => return Err(ParsingError::UnknownConstantTag(tag)),
        };
        log::debug!("Constant #{}: {}", i, entry);
        constants.push(entry);
    }

    Ok(ConstantPool::new(constants))
}

/// Reads a constant pool index and checks that it lies in `1..declared`, even though
/// the entry it points to may not have been read yet.
fn read_index(
    iter: &mut ClassFileIterator,
    declared: u16,
) -> Result<ConstantPoolIndex, ParsingError> {
    let index = iter.u16()?;
    if index == 0 || index >= declared {
        return Err(ParsingError::InvalidConstantIndex(index, declared));
    }
    Ok(index.into())
}

fn read_member(
    iter: &mut ClassFileIterator,
    declared: u16,
) -> Result<MemberReference, ParsingError> {
    Ok(MemberReference {
        class: read_index(iter, declared)?,
        name_and_type: read_index(iter, declared)?,
    })
}

fn parse_methods(
    iter: &mut ClassFileIterator,
    constant_pool: &ConstantPool,
) -> Result<Vec<Method>, ParsingError> {
    let method_count = iter.u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);

    for _ in 0..method_count {
        let access_flags = MethodAccessFlags::from_bits_truncate(iter.u16()?);

        let name_index: ConstantPoolIndex = iter.u16()?.into();
        let name = constant_pool.get_utf8(name_index)?;

        let descriptor_index: ConstantPoolIndex = iter.u16()?.into();
        let descriptor = constant_pool.get_utf8(descriptor_index)?;
        log::debug!("Method {}{} ({:?})", name, descriptor, access_flags);

        // Only a single Code attribute is supported
        let attribute_count = iter.u16()?;
        if attribute_count != 1 {
            return Err(ParsingError::UnexpectedAttributeCount(
                name.to_string(),
                attribute_count,
            ));
        }

        let attribute_name = constant_pool.get_utf8(iter.u16()?.into())?;
        if attribute_name != attribute::CODE {
            return Err(ParsingError::MissingCode(
                name.to_string(),
                attribute_name.to_string(),
            ));
        }
        let _length = iter.u32()?;

        let max_stack = iter.u16()? as usize;
        let max_locals = iter.u16()? as usize;
        let code_length = iter.u32()?;
        let code = iter.take_bytes(code_length as usize)?.to_vec();
        log::debug!(
            "Read {} bytes of code (max_stack={}, max_locals={})",
            code.len(),
            max_stack,
            max_locals
        );

        // Exception handling is not supported, skip the table
        let exception_table_length = iter.u16()?;
        iter.skip_bytes(exception_table_length as usize * 8)?;

        skip_attributes(iter, constant_pool)?;

        methods.push(Method {
            access_flags,
            name_index,
            descriptor_index,
            max_stack,
            max_locals,
            code,
        });
    }

    Ok(methods)
}

fn skip_attributes(
    iter: &mut ClassFileIterator,
    constant_pool: &ConstantPool,
) -> Result<(), ParsingError> {
    let count = iter.u16()?;
    for _ in 0..count {
        let name = constant_pool.get_utf8(iter.u16()?.into())?;
        let length = iter.u32()? as usize;
        log::info!("Skipping attribute '{}'", name);
        iter.skip_bytes(length)?;
    }
    Ok(())
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("missing magic number, found {0:#010x}")]
    MissingMagicNumber(u32),

    #[error("unexpected end of file")]
    UnexpectedEOF {
        #[from]
        source: UnexpectedEof,
    },

    #[error("invalid constant pool count {0}")]
    InvalidConstantPoolCount(u16),

    #[error("unknown constant tag {0}")]
    UnknownConstantTag(u8),

    #[error("invalid utf string at constant index {0}: {1}")]
    InvalidUtf8Constant(u16, Utf8Error),

    #[error("constant pool index {0} is outside of 1..{1}")]
    InvalidConstantIndex(u16, u16),

    #[error("fields are not supported, but the class declares {0}")]
    UnsupportedFields(u16),

    #[error("method {0} has {1} attributes, expected exactly one Code attribute")]
    UnexpectedAttributeCount(String, u16),

    #[error("no code attribute found for method {0}, found '{1}' instead")]
    MissingCode(String, String),

    #[error("{0} unconsumed bytes after the end of the class file")]
    TrailingBytes(usize),

    #[error("constant pool error")]
    ConstantPool {
        #[from]
        source: ConstantPoolError,
    },
}
