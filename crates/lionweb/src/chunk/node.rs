//! Serialized node records.

use serde::{Deserialize, Serialize};

use crate::language::MetaPointer;

/// One node of a chunk. Containment is expressed through child ids only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    pub id: String,
    #[serde(alias = "concept")]
    pub classifier: MetaPointer,
    #[serde(default)]
    pub properties: Vec<SerializedProperty>,
    #[serde(default)]
    pub containments: Vec<SerializedContainment>,
    #[serde(default)]
    pub references: Vec<SerializedReference>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedProperty {
    pub property: MetaPointer,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedContainment {
    pub containment: MetaPointer,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedReference {
    pub reference: MetaPointer,
    #[serde(default)]
    pub targets: Vec<ReferenceTarget>,
}

/// A reference entry: target id and/or textual resolve info, either may be null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTarget {
    #[serde(default)]
    pub resolve_info: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl ReferenceTarget {
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            resolve_info: None,
            reference: Some(id.into()),
        }
    }

    pub fn with_resolve_info(mut self, info: impl Into<String>) -> Self {
        self.resolve_info = Some(info.into());
        self
    }
}

impl SerializedNode {
    /// Creates a node with no features and no parent.
    pub fn new(id: impl Into<String>, classifier: MetaPointer) -> Self {
        Self {
            id: id.into(),
            classifier,
            properties: Vec::new(),
            containments: Vec::new(),
            references: Vec::new(),
            annotations: Vec::new(),
            parent: None,
        }
    }

    pub fn with_property(mut self, property: MetaPointer, value: impl Into<String>) -> Self {
        self.properties.push(SerializedProperty {
            property,
            value: Some(value.into()),
        });
        self
    }

    pub fn with_children<I, S>(mut self, containment: MetaPointer, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.containments.push(SerializedContainment {
            containment,
            children: children.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_targets(
        mut self,
        reference: MetaPointer,
        targets: impl IntoIterator<Item = ReferenceTarget>,
    ) -> Self {
        self.references.push(SerializedReference {
            reference,
            targets: targets.into_iter().collect(),
        });
        self
    }

    pub fn with_annotation(mut self, id: impl Into<String>) -> Self {
        self.annotations.push(id.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Value of the first entry for `property`; `None` if absent or null.
    pub fn property_value(&self, property: &MetaPointer) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.property == *property)
            .and_then(|p| p.value.as_deref())
    }

    /// Child ids of the first slot for `containment`; empty if absent.
    pub fn children(&self, containment: &MetaPointer) -> &[String] {
        self.containments
            .iter()
            .find(|c| c.containment == *containment)
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    /// Targets of the first slot for `reference`; empty if absent.
    pub fn targets(&self, reference: &MetaPointer) -> &[ReferenceTarget] {
        self.references
            .iter()
            .find(|r| r.reference == *reference)
            .map(|r| r.targets.as_slice())
            .unwrap_or(&[])
    }

    /// All ids this node owns: containment children, then annotations.
    pub fn owned_ids(&self) -> impl Iterator<Item = &str> {
        self.containments
            .iter()
            .flat_map(|c| c.children.iter())
            .chain(self.annotations.iter())
            .map(String::as_str)
    }

    /// Sorts feature slots by meta-pointer. Child and target order is kept.
    pub fn canonicalize(&mut self) {
        self.properties.sort_by(|a, b| a.property.cmp(&b.property));
        self.containments
            .sort_by(|a, b| a.containment.cmp(&b.containment));
        self.references.sort_by(|a, b| a.reference.cmp(&b.reference));
    }
}
