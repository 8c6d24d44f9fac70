use std::{fmt::Display, iter::Peekable};

use unicode_segmentation::{Graphemes, UnicodeSegmentation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JvmType {
    Void,
    Byte,
    Char,
    Integer,
    Long,
    Float,
    Double,
    Reference(String),
    Array(Box<JvmType>),
    Short,
    Boolean,
}

impl JvmType {
    pub fn parse(graphemes: &mut Peekable<Graphemes>) -> Option<JvmType> {
        match graphemes.next()? {
            "B" => Some(JvmType::Byte),
            "C" => Some(JvmType::Char),
            "D" => Some(JvmType::Double),
            "F" => Some(JvmType::Float),
            "I" => Some(JvmType::Integer),
            "J" => Some(JvmType::Long),
            "S" => Some(JvmType::Short),
            "Z" => Some(JvmType::Boolean),
            "V" => Some(JvmType::Void),
            "L" => {
                let mut class = String::new();
                loop {
                    match graphemes.next()? {
                        ";" => break,
                        c => class.push_str(c),
                    }
                }
                Some(JvmType::Reference(class))
            }
            "[" => JvmType::parse(graphemes).map(|ty| JvmType::Array(Box::new(ty))),
            _ => None,
        }
    }
}

impl Display for JvmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A parsed method descriptor such as `(II)I`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<JvmType>,
    pub return_type: JvmType,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidMethodDescriptor(descriptor.to_string());

        let mut graphemes = descriptor.graphemes(true).peekable();
        if graphemes.next() != Some("(") {
            return Err(invalid());
        }

        let mut parameters = Vec::new();
        while graphemes.peek() != Some(&")") {
            match JvmType::parse(&mut graphemes) {
                Some(JvmType::Void) | None => return Err(invalid()),
                Some(ty) => parameters.push(ty),
            }
        }
        graphemes.next();

        let return_type = JvmType::parse(&mut graphemes).ok_or_else(invalid)?;
        if graphemes.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            parameters,
            return_type,
        })
    }

    pub fn argument_count(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid method descriptor {0}")]
    InvalidMethodDescriptor(String),
}
