//! Typed property values and non-owning reference values.

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Json(serde_json::Value),
    /// Key of an enumeration literal.
    Enumeration(String),
    /// Value of a primitive type the core has no decoding rule for.
    Raw(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Raw(s) | PropertyValue::Enumeration(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

/// A reference entry stored as relation plus lookup: the target is kept as
/// an id and resolved through [`Graph::resolve`](crate::Graph::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ReferenceValue {
    pub target: Option<String>,
    pub resolve_info: Option<String>,
}

impl ReferenceValue {
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            target: Some(id.into()),
            resolve_info: None,
        }
    }

    /// A reference known only by its textual resolve info.
    pub fn unresolved(resolve_info: impl Into<String>) -> Self {
        Self {
            target: None,
            resolve_info: Some(resolve_info.into()),
        }
    }

    pub fn with_resolve_info(mut self, info: impl Into<String>) -> Self {
        self.resolve_info = Some(info.into());
        self
    }
}
