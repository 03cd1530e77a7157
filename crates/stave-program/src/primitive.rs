//! Primitive operand encoding.
//!
//! A primitive operand packs a 3-bit type tag into the low bits and a
//! payload into the remaining 29 bits. Small non-negative integers are
//! stored inline; every other value is interned and the payload is its
//! pool index.

use crate::builder::PoolBuilder;
use crate::ids::{FloatId, NegativeId, StringId};
use crate::pool::ConstantPool;
use thiserror::Error;

/// Type tag in the low three bits of a primitive operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PrimitiveType {
    Number = 0b000,
    Float = 0b001,
    String = 0b010,
    BooleanOrVoid = 0b011,
    Negative = 0b100,
}

impl PrimitiveType {
    pub const BITS: u32 = 3;
    pub const MASK: u32 = 0b111;

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0b000 => Some(Self::Number),
            0b001 => Some(Self::Float),
            0b010 => Some(Self::String),
            0b011 => Some(Self::BooleanOrVoid),
            0b100 => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Largest payload an operand can carry.
pub const MAX_PAYLOAD: u32 = u32::MAX >> PrimitiveType::BITS;

// BOOLEAN_OR_VOID payloads
const FALSE: u32 = 0;
const TRUE: u32 = 1;
const NULL: u32 = 2;
const UNDEFINED: u32 = 3;

/// A primitive value, either to be encoded or as decoded from a pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    #[error("unknown primitive type tag {0:#05b}")]
    UnknownTag(u8),
    #[error("invalid boolean-or-void payload {0}")]
    InvalidBooleanOrVoid(u32),
    #[error("negative primitive refers to NULL")]
    NullNegative,
}

pub fn encode_operand(ty: PrimitiveType, payload: u32) -> u32 {
    assert!(
        payload <= MAX_PAYLOAD,
        "primitive payload {payload} does not fit in an operand"
    );
    (payload << PrimitiveType::BITS) | ty as u32
}

impl<T, S> PoolBuilder<T, S> {
    /// Intern `value` as needed and return its encoded operand.
    ///
    /// Integers in `0..=MAX_PAYLOAD` are inline, negative integers go to
    /// the negatives family, larger integers and all floats to the floats
    /// family.
    pub fn intern_primitive(&mut self, value: Primitive<'_>) -> u32 {
        let (ty, payload) = match value {
            Primitive::Int(n) if (0..=MAX_PAYLOAD as i64).contains(&n) => {
                (PrimitiveType::Number, n as u32)
            }
            Primitive::Int(n) if n < 0 => (PrimitiveType::Negative, self.intern_negative(n).raw()),
            Primitive::Int(n) => (PrimitiveType::Float, self.intern_float(n as f64).raw()),
            Primitive::Float(f) => (PrimitiveType::Float, self.intern_float(f).raw()),
            Primitive::Str(s) => (PrimitiveType::String, self.intern_string(s).raw()),
            Primitive::Bool(true) => (PrimitiveType::BooleanOrVoid, TRUE),
            Primitive::Bool(false) => (PrimitiveType::BooleanOrVoid, FALSE),
            Primitive::Null => (PrimitiveType::BooleanOrVoid, NULL),
            Primitive::Undefined => (PrimitiveType::BooleanOrVoid, UNDEFINED),
        };
        encode_operand(ty, payload)
    }
}

impl<T, S> ConstantPool<T, S> {
    /// Decode a primitive operand against this pool.
    pub fn get_primitive(&self, operand: u32) -> Result<Primitive<'_>, PrimitiveError> {
        let tag = (operand & PrimitiveType::MASK) as u8;
        let payload = operand >> PrimitiveType::BITS;

        match PrimitiveType::from_tag(tag).ok_or(PrimitiveError::UnknownTag(tag))? {
            PrimitiveType::Number => Ok(Primitive::Int(payload as i64)),
            PrimitiveType::Float => Ok(Primitive::Float(self.get_float(FloatId::from_raw(payload)))),
            PrimitiveType::String => Ok(Primitive::Str(self.get_string(StringId::from_raw(payload)))),
            PrimitiveType::BooleanOrVoid => match payload {
                FALSE => Ok(Primitive::Bool(false)),
                TRUE => Ok(Primitive::Bool(true)),
                NULL => Ok(Primitive::Null),
                UNDEFINED => Ok(Primitive::Undefined),
                other => Err(PrimitiveError::InvalidBooleanOrVoid(other)),
            },
            PrimitiveType::Negative => {
                let id = NegativeId::from_raw(payload).ok_or(PrimitiveError::NullNegative)?;
                Ok(Primitive::Int(self.get_negative(id)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_ints_are_inline() {
        let mut builder = PoolBuilder::<(), ()>::new();

        let operand = builder.intern_primitive(Primitive::Int(5));
        assert_eq!(operand, 5 << 3);
        assert!(builder.pool().is_empty());
        assert_eq!(builder.pool().get_primitive(operand), Ok(Primitive::Int(5)));
    }

    #[test]
    fn pooled_primitives_decode_through_pool() {
        let mut builder = PoolBuilder::<(), ()>::new();
        let values = [
            Primitive::Int(-7),
            Primitive::Int(i64::from(MAX_PAYLOAD) + 1),
            Primitive::Float(0.5),
            Primitive::Str("label"),
            Primitive::Bool(true),
            Primitive::Bool(false),
            Primitive::Null,
            Primitive::Undefined,
        ];
        let operands: Vec<u32> = values.iter().map(|&v| builder.intern_primitive(v)).collect();
        let pool = builder.export();

        let decoded: Vec<Primitive<'_>> = operands
            .iter()
            .map(|&operand| pool.get_primitive(operand).unwrap())
            .collect();

        assert_eq!(decoded[0], Primitive::Int(-7));
        assert_eq!(decoded[1], Primitive::Float((MAX_PAYLOAD as f64) + 1.0));
        assert_eq!(&decoded[2..], &values[2..]);
        assert_eq!(pool.negatives, vec![-7]);
    }

    #[test]
    fn malformed_operands_are_rejected() {
        let pool = ConstantPool::<(), ()>::new();

        assert_eq!(pool.get_primitive(0b101), Err(PrimitiveError::UnknownTag(0b101)));
        assert_eq!(
            pool.get_primitive((4 << 3) | PrimitiveType::BooleanOrVoid as u32),
            Err(PrimitiveError::InvalidBooleanOrVoid(4))
        );
        assert_eq!(
            pool.get_primitive(PrimitiveType::Negative as u32),
            Err(PrimitiveError::NullNegative)
        );
    }
}
