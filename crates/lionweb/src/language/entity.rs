//! Schema element types: languages, classifiers, data types and features.

use crate::language::{LanguageRef, MetaPointer};

/// A named, versioned set of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub name: String,
    pub key: String,
    pub version: String,
    pub entities: Vec<Entity>,
    /// Languages whose elements this language refers to.
    pub depends_on: Vec<LanguageRef>,
}

impl Language {
    /// Creates an empty language.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            version: version.into(),
            entities: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn reference(&self) -> LanguageRef {
        LanguageRef::new(self.key.clone(), self.version.clone())
    }

    /// Builds a meta-pointer to an element of this language.
    pub fn pointer(&self, key: impl Into<String>) -> MetaPointer {
        MetaPointer::new(self.key.clone(), self.version.clone(), key)
    }

    /// Looks up an entity by key.
    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.key() == key)
    }

    /// Looks up an entity by display name.
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }
}

/// A top-level element of a language.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Concept(Concept),
    Annotation(Annotation),
    Interface(Interface),
    Enumeration(Enumeration),
    PrimitiveType(PrimitiveType),
}

impl Entity {
    pub fn key(&self) -> &str {
        match self {
            Entity::Concept(c) => &c.key,
            Entity::Annotation(a) => &a.key,
            Entity::Interface(i) => &i.key,
            Entity::Enumeration(e) => &e.key,
            Entity::PrimitiveType(p) => &p.key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Concept(c) => &c.name,
            Entity::Annotation(a) => &a.name,
            Entity::Interface(i) => &i.name,
            Entity::Enumeration(e) => &e.name,
            Entity::PrimitiveType(p) => &p.name,
        }
    }

    /// Short lowercase name of the entity kind, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Concept(_) => "concept",
            Entity::Annotation(_) => "annotation",
            Entity::Interface(_) => "interface",
            Entity::Enumeration(_) => "enumeration",
            Entity::PrimitiveType(_) => "primitive type",
        }
    }

    /// Locally declared features. Data types have none.
    pub fn features(&self) -> &[Feature] {
        match self {
            Entity::Concept(c) => &c.features,
            Entity::Annotation(a) => &a.features,
            Entity::Interface(i) => &i.features,
            Entity::Enumeration(_) | Entity::PrimitiveType(_) => &[],
        }
    }

    /// Direct supertypes, super-concept first, then interfaces in declaration order.
    pub fn supertypes(&self) -> Vec<&MetaPointer> {
        match self {
            Entity::Concept(c) => c.extends.iter().chain(c.implements.iter()).collect(),
            Entity::Annotation(a) => a.extends.iter().chain(a.implements.iter()).collect(),
            Entity::Interface(i) => i.extends.iter().collect(),
            Entity::Enumeration(_) | Entity::PrimitiveType(_) => Vec::new(),
        }
    }

    /// True for concepts, annotations and interfaces.
    pub fn is_classifier(&self) -> bool {
        matches!(
            self,
            Entity::Concept(_) | Entity::Annotation(_) | Entity::Interface(_)
        )
    }

    /// True for data types (primitive types and enumerations).
    pub fn is_data_type(&self) -> bool {
        matches!(self, Entity::Enumeration(_) | Entity::PrimitiveType(_))
    }

    /// True if nodes may have this entity as their classifier.
    pub fn is_instantiable(&self) -> bool {
        match self {
            Entity::Concept(c) => !c.is_abstract,
            Entity::Annotation(_) => true,
            _ => false,
        }
    }
}

/// A node type with at most one super-concept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Concept {
    pub key: String,
    pub name: String,
    pub is_abstract: bool,
    /// Partitions are nodes that may never have a parent.
    pub partition: bool,
    pub extends: Option<MetaPointer>,
    pub implements: Vec<MetaPointer>,
    pub features: Vec<Feature>,
}

/// A classifier whose instances are attached to other nodes as annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub key: String,
    pub name: String,
    /// The classifier this annotation may be attached to.
    pub annotates: Option<MetaPointer>,
    pub extends: Option<MetaPointer>,
    pub implements: Vec<MetaPointer>,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interface {
    pub key: String,
    pub name: String,
    pub extends: Vec<MetaPointer>,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Enumeration {
    pub key: String,
    pub name: String,
    pub literals: Vec<EnumerationLiteral>,
}

impl Enumeration {
    pub fn literal(&self, key: &str) -> Option<&EnumerationLiteral> {
        self.literals.iter().find(|l| l.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumerationLiteral {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrimitiveType {
    pub key: String,
    pub name: String,
}

/// Property, containment or reference declared on a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub key: String,
    pub name: String,
    pub optional: bool,
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    /// Primitive-valued; `ty` points at a primitive type or enumeration.
    Property { ty: MetaPointer },
    /// Owns child nodes.
    Containment { ty: MetaPointer, multiple: bool },
    /// Non-owning link to nodes anywhere.
    Reference { ty: MetaPointer, multiple: bool },
}

impl Feature {
    pub fn property(
        key: impl Into<String>,
        name: impl Into<String>,
        ty: MetaPointer,
        optional: bool,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            optional,
            kind: FeatureKind::Property { ty },
        }
    }

    pub fn containment(
        key: impl Into<String>,
        name: impl Into<String>,
        ty: MetaPointer,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            optional: multiplicity.is_optional(),
            kind: FeatureKind::Containment {
                ty,
                multiple: multiplicity.is_multiple(),
            },
        }
    }

    pub fn reference(
        key: impl Into<String>,
        name: impl Into<String>,
        ty: MetaPointer,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            optional: multiplicity.is_optional(),
            kind: FeatureKind::Reference {
                ty,
                multiple: multiplicity.is_multiple(),
            },
        }
    }

    /// The declared type of the feature's values.
    pub fn ty(&self) -> &MetaPointer {
        match &self.kind {
            FeatureKind::Property { ty }
            | FeatureKind::Containment { ty, .. }
            | FeatureKind::Reference { ty, .. } => ty,
        }
    }

    /// Properties are always single-valued.
    pub fn is_multiple(&self) -> bool {
        match self.kind {
            FeatureKind::Property { .. } => false,
            FeatureKind::Containment { multiple, .. } | FeatureKind::Reference { multiple, .. } => {
                multiple
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::Property { .. } => "property",
            FeatureKind::Containment { .. } => "containment",
            FeatureKind::Reference { .. } => "reference",
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, FeatureKind::Property { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(self.kind, FeatureKind::Containment { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }
}

/// Cardinality of a link feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// 0..1
    Optional,
    /// 1
    Single,
    /// 0..*
    ZeroOrMore,
    /// 1..*
    OneOrMore,
}

impl Multiplicity {
    pub fn is_optional(self) -> bool {
        matches!(self, Multiplicity::Optional | Multiplicity::ZeroOrMore)
    }

    pub fn is_multiple(self) -> bool {
        matches!(self, Multiplicity::ZeroOrMore | Multiplicity::OneOrMore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicity_flags() {
        let f = Feature::containment("k", "items", MetaPointer::new("l", "1", "t"), Multiplicity::OneOrMore);
        assert!(!f.optional);
        assert!(f.is_multiple());
        assert_eq!(f.kind_name(), "containment");

        let r = Feature::reference("r", "link", MetaPointer::new("l", "1", "t"), Multiplicity::Optional);
        assert!(r.optional);
        assert!(!r.is_multiple());
    }

    #[test]
    fn test_supertypes_order() {
        let concept = Entity::Concept(Concept {
            key: "c".into(),
            name: "C".into(),
            extends: Some(MetaPointer::new("l", "1", "base")),
            implements: vec![MetaPointer::new("l", "1", "i1"), MetaPointer::new("l", "1", "i2")],
            ..Default::default()
        });
        let keys: Vec<_> = concept.supertypes().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["base", "i1", "i2"]);
    }

    #[test]
    fn test_abstract_concept_not_instantiable() {
        let concept = Entity::Concept(Concept {
            key: "c".into(),
            name: "C".into(),
            is_abstract: true,
            ..Default::default()
        });
        assert!(concept.is_classifier());
        assert!(!concept.is_instantiable());
    }
}
