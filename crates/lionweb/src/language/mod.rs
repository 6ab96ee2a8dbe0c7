//! Schema model: languages, classifiers, features and their registry.
//!
//! - [`pointer`]: meta-pointers and language references
//! - [`entity`]: entity and feature definitions
//! - [`builder`]: fluent language construction
//! - [`keys`]: pluggable key and id derivation
//! - [`builtins`]: the `LionCore-builtins` language
//! - [`registry`]: hash-indexed resolution and schema checks

pub mod builder;
pub mod builtins;
pub mod entity;
pub mod keys;
pub mod pointer;
pub mod registry;

pub use builder::{ClassifierBuilder, LanguageBuilder, TypeRef};
pub use entity::{
    Annotation, Concept, Entity, Enumeration, EnumerationLiteral, Feature, FeatureKind, Interface,
    Language, Multiplicity, PrimitiveType,
};
pub use keys::{HashedKeys, IdGenerator, KeyGenerator, QualifiedNameKeys, SequentialIds, UuidIds, derived_uuid};
pub use pointer::{LanguageRef, MetaPointer};
pub use registry::{Element, FeatureRef, LanguageRegistry};
