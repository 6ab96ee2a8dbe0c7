//! The `LionCore-builtins` language: primitive types and `INamed`.
//!
//! Every [`LanguageRegistry`](crate::LanguageRegistry) contains it.

use lazy_static::lazy_static;

use crate::language::{Entity, Feature, Interface, Language, MetaPointer, PrimitiveType};

pub const KEY: &str = "LionCore-builtins";
pub const VERSION: &str = "2023.1";

pub const STRING: &str = "LionCore-builtins-String";
pub const BOOLEAN: &str = "LionCore-builtins-Boolean";
pub const INTEGER: &str = "LionCore-builtins-Integer";
pub const JSON: &str = "LionCore-builtins-JSON";
pub const INAMED: &str = "LionCore-builtins-INamed";
pub const INAMED_NAME: &str = "LionCore-builtins-INamed-name";

lazy_static! {
    /// The builtins language instance.
    pub static ref BUILTINS: Language = build();
}

fn pointer(key: &str) -> MetaPointer {
    MetaPointer::new(KEY, VERSION, key)
}

pub fn string() -> MetaPointer {
    pointer(STRING)
}

pub fn boolean() -> MetaPointer {
    pointer(BOOLEAN)
}

pub fn integer() -> MetaPointer {
    pointer(INTEGER)
}

pub fn json() -> MetaPointer {
    pointer(JSON)
}

pub fn inamed() -> MetaPointer {
    pointer(INAMED)
}

pub fn inamed_name() -> MetaPointer {
    pointer(INAMED_NAME)
}

fn primitive(key: &str, name: &str) -> Entity {
    Entity::PrimitiveType(PrimitiveType {
        key: key.to_string(),
        name: name.to_string(),
    })
}

fn build() -> Language {
    let mut language = Language::new(KEY, KEY, VERSION);
    language.entities = vec![
        primitive(STRING, "String"),
        primitive(BOOLEAN, "Boolean"),
        primitive(INTEGER, "Integer"),
        primitive(JSON, "JSON"),
        Entity::Interface(Interface {
            key: INAMED.to_string(),
            name: "INamed".to_string(),
            extends: Vec::new(),
            features: vec![Feature::property(INAMED_NAME, "name", string(), false)],
        }),
    ];
    language
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_contents() {
        assert_eq!(BUILTINS.key, KEY);
        assert_eq!(BUILTINS.entities.len(), 5);
        assert!(BUILTINS.entity(STRING).is_some_and(Entity::is_data_type));

        let inamed = BUILTINS.entity(INAMED).unwrap();
        assert_eq!(inamed.features()[0].ty(), &string());
        assert!(!inamed.features()[0].optional);
    }
}
