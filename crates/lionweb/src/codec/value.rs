//! Property value text encoding.
//!
//! Each primitive type has one textual form and decoding accepts exactly
//! what encoding produces:
//! - `Boolean`: `true` / `false`
//! - `Integer`: decimal, optional leading `-`, no leading zeros, no `+`
//! - `JSON`: any JSON document, written back compactly
//! - enumerations: the literal key
//! - `String` and unknown primitive types: the text itself

use crate::error::ValueError;
use crate::graph::PropertyValue;
use crate::language::builtins;
use crate::language::{Entity, Enumeration, LanguageRegistry, MetaPointer};

/// How the value of a property is decoded.
#[derive(Debug, Clone, Copy)]
pub enum ValueType<'a> {
    String,
    Boolean,
    Integer,
    Json,
    Enumeration(&'a Enumeration),
    /// A primitive type without a decoding rule; values stay raw text.
    Other,
}

/// Determines the value type for a property type pointer.
///
/// Returns `None` if the pointer does not resolve to a data type.
pub fn value_type<'a>(registry: &'a LanguageRegistry, ty: &MetaPointer) -> Option<ValueType<'a>> {
    if ty.language == builtins::KEY {
        match ty.key.as_str() {
            builtins::STRING => return Some(ValueType::String),
            builtins::BOOLEAN => return Some(ValueType::Boolean),
            builtins::INTEGER => return Some(ValueType::Integer),
            builtins::JSON => return Some(ValueType::Json),
            _ => {}
        }
    }
    match registry.entity(ty)? {
        Entity::Enumeration(enumeration) => Some(ValueType::Enumeration(enumeration)),
        Entity::PrimitiveType(_) => Some(ValueType::Other),
        _ => None,
    }
}

/// Encodes a value as chunk text.
pub fn encode_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) | PropertyValue::Raw(s) | PropertyValue::Enumeration(s) => {
            s.clone()
        }
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Json(json) => json.to_string(),
    }
}

/// Decodes chunk text according to the value type.
pub fn decode_value(text: &str, ty: ValueType<'_>) -> Result<PropertyValue, ValueError> {
    match ty {
        ValueType::String => Ok(PropertyValue::String(text.to_string())),
        ValueType::Other => Ok(PropertyValue::Raw(text.to_string())),
        ValueType::Boolean => match text {
            "true" => Ok(PropertyValue::Boolean(true)),
            "false" => Ok(PropertyValue::Boolean(false)),
            _ => Err(ValueError::InvalidBoolean {
                found: text.to_string(),
            }),
        },
        ValueType::Integer => decode_integer(text).map(PropertyValue::Integer),
        ValueType::Json => serde_json::from_str(text)
            .map(PropertyValue::Json)
            .map_err(|e| ValueError::InvalidJson {
                message: e.to_string(),
            }),
        ValueType::Enumeration(enumeration) => match enumeration.literal(text) {
            Some(literal) => Ok(PropertyValue::Enumeration(literal.key.clone())),
            None => Err(ValueError::UnknownLiteral {
                enumeration: enumeration.name.clone(),
                found: text.to_string(),
            }),
        },
    }
}

fn decode_integer(text: &str) -> Result<i64, ValueError> {
    let invalid = || ValueError::InvalidInteger {
        found: text.to_string(),
    };
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(invalid());
    }
    if text == "-0" {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}
