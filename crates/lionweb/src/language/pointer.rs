//! Meta-pointers: instance-independent addresses of schema elements.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a language by key and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageRef {
    pub key: String,
    pub version: String,
}

impl LanguageRef {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for LanguageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.key, self.version)
    }
}

/// Addresses an entity, feature or literal as (language key, language version, element key).
///
/// Field names match the chunk JSON: `{"language": .., "version": .., "key": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetaPointer {
    pub language: String,
    pub version: String,
    pub key: String,
}

impl MetaPointer {
    pub fn new(
        language: impl Into<String>,
        version: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            key: key.into(),
        }
    }

    /// The language this pointer points into.
    pub fn language_ref(&self) -> LanguageRef {
        LanguageRef::new(self.language.clone(), self.version.clone())
    }

    /// Returns true if this pointer points into the given language.
    pub fn is_in(&self, language: &LanguageRef) -> bool {
        self.language == language.key && self.version == language.version
    }
}

impl fmt::Display for MetaPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.language, self.version, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let pointer = MetaPointer::new("files", "1", "files-Folder");
        let json = serde_json::to_string(&pointer).unwrap();
        assert_eq!(
            json,
            r#"{"language":"files","version":"1","key":"files-Folder"}"#
        );
    }

    #[test]
    fn test_language_ref() {
        let pointer = MetaPointer::new("files", "1", "files-Folder");
        assert!(pointer.is_in(&LanguageRef::new("files", "1")));
        assert!(!pointer.is_in(&LanguageRef::new("files", "2")));
        assert_eq!(pointer.to_string(), "files@1#files-Folder");
    }
}
