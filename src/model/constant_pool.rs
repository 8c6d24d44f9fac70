use std::fmt::Display;

/// The constant pool of a class, addressed from 1 like in the class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<ConstantPoolEntry>,
}

impl ConstantPool {
    pub fn new(entries: Vec<ConstantPoolEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries (one less than the count stored in the class file).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstantPoolIndex, &'_ ConstantPoolEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (ConstantPoolIndex(i as u16 + 1), entry))
    }

    pub fn get(
        &self,
        index: ConstantPoolIndex,
    ) -> Result<&'_ ConstantPoolEntry, ConstantPoolError> {
        // Index 0 is never valid
        (index.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(ConstantPoolError::MissingEntry(index))
    }

    pub fn get_utf8(&self, index: ConstantPoolIndex) -> Result<&'_ str, ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::Utf8(string) => Ok(string),
            _ => Err(ConstantPoolError::NotAnUtf8String(index, value.clone())),
        }
    }

    pub fn get_class(
        &self,
        index: ConstantPoolIndex,
    ) -> Result<ConstantPoolIndex, ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::Class { name } => Ok(*name),
            _ => Err(ConstantPoolError::NotAClassReference(index, value.clone())),
        }
    }

    /// Resolves a class entry straight to its binary name.
    pub fn get_class_name(&self, index: ConstantPoolIndex) -> Result<&'_ str, ConstantPoolError> {
        self.get_utf8(self.get_class(index)?)
    }

    pub fn get_string(&self, index: ConstantPoolIndex) -> Result<&'_ str, ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::String { string } => self.get_utf8(*string),
            _ => Err(ConstantPoolError::NotAString(index, value.clone())),
        }
    }

    pub fn get_field_reference(
        &self,
        index: ConstantPoolIndex,
    ) -> Result<MemberReference, ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::FieldReference(reference) => Ok(*reference),
            _ => Err(ConstantPoolError::NotAFieldReference(index, value.clone())),
        }
    }

    pub fn get_method_reference(
        &self,
        index: ConstantPoolIndex,
    ) -> Result<MemberReference, ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::MethodReference(reference) => Ok(*reference),
            _ => Err(ConstantPoolError::NotAMethodReference(index, value.clone())),
        }
    }

    pub fn get_name_and_type(
        &self,
        index: ConstantPoolIndex,
    ) -> Result<(ConstantPoolIndex, ConstantPoolIndex), ConstantPoolError> {
        let value = self.get(index)?;
        match value {
            ConstantPoolEntry::NameAndType { name, ty } => Ok((*name, *ty)),
            _ => Err(ConstantPoolError::NotNameAndType(index, value.clone())),
        }
    }

    /// Follows a field or method reference down to its class name, member name and descriptor.
    pub fn resolve_member(
        &self,
        reference: MemberReference,
    ) -> Result<ResolvedMember<'_>, ConstantPoolError> {
        let class = self.get_class_name(reference.class)?;
        let (name, ty) = self.get_name_and_type(reference.name_and_type)?;
        Ok(ResolvedMember {
            class,
            name: self.get_utf8(name)?,
            descriptor: self.get_utf8(ty)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ConstantPoolIndex(u16);

impl From<u16> for ConstantPoolIndex {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

impl From<u8> for ConstantPoolIndex {
    fn from(index: u8) -> Self {
        Self(index as u16)
    }
}

impl Display for ConstantPoolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberReference {
    pub class: ConstantPoolIndex,
    pub name_and_type: ConstantPoolIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantPoolEntry {
    Utf8(String),
    Class {
        name: ConstantPoolIndex,
    },
    String {
        string: ConstantPoolIndex,
    },
    FieldReference(MemberReference),
    MethodReference(MemberReference),
    NameAndType {
        name: ConstantPoolIndex,
        ty: ConstantPoolIndex,
    },
}

impl Display for ConstantPoolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A member reference with every index chased down to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMember<'p> {
    pub class: &'p str,
    pub name: &'p str,
    pub descriptor: &'p str,
}

impl Display for ResolvedMember<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}{}", self.class, self.name, self.descriptor)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstantPoolError {
    #[error("there is no constant pool entry at {0}")]
    MissingEntry(ConstantPoolIndex),

    #[error("The constant pool entry at {0} is expected to be of type UTF8, but is actually {1}")]
    NotAnUtf8String(ConstantPoolIndex, ConstantPoolEntry),

    #[error("The constant pool entry at {0} is expected to be of type class, but is actually {1}")]
    NotAClassReference(ConstantPoolIndex, ConstantPoolEntry),

    #[error("The constant pool entry at {0} is expected to be of type String, but is actually {1}")]
    NotAString(ConstantPoolIndex, ConstantPoolEntry),

    #[error("The constant pool entry at {0} is expected to be of type Fieldref, but is actually {1}")]
    NotAFieldReference(ConstantPoolIndex, ConstantPoolEntry),

    #[error("The constant pool entry at {0} is expected to be of type Methodref, but is actually {1}")]
    NotAMethodReference(ConstantPoolIndex, ConstantPoolEntry),

    #[error("The constant pool entry at {0} is expected to be of type NameAndType, but is actually {1}")]
    NotNameAndType(ConstantPoolIndex, ConstantPoolEntry),
}
