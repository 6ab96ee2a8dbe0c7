//! Error types for schema construction, chunk encoding/decoding and
//! graph resolution.
//!
//! These are the fatal failures. Anything that still allows a sound
//! interpretation of the input is reported as an [`Issue`](crate::Issue)
//! instead.

use thiserror::Error;

use crate::language::MetaPointer;

/// Error while building a language or a language registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("language {language}: key {key:?} is used more than once")]
    DuplicateKey { language: String, key: String },

    #[error("language {key}@{version} is registered more than once")]
    DuplicateLanguage { key: String, version: String },

    #[error("language {language} depends on {key}@{version}, which is not registered")]
    MissingDependency {
        language: String,
        key: String,
        version: String,
    },

    #[error("cyclic language dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("{element} refers to {pointer}, which does not resolve")]
    UnresolvedType { element: String, pointer: MetaPointer },

    #[error("{element} refers to unknown local type {name:?}")]
    UnknownLocalType { element: String, name: String },

    #[error("{element} cannot use {pointer} as {role}: expected {expected}")]
    InvalidSupertype {
        element: String,
        pointer: MetaPointer,
        role: &'static str,
        expected: &'static str,
    },

    #[error("classifier {classifier} inherits two different features with key {key:?}")]
    DuplicateFeatureKey { classifier: MetaPointer, key: String },
}

/// Error while turning an object graph into a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("node {node:?} has classifier {classifier}, which is not in the registry")]
    UnknownClassifier { node: String, classifier: MetaPointer },

    #[error("node {node:?} was reached twice while walking containments")]
    ContainmentCycle { node: String },

    #[error("root handle {index} does not belong to this graph")]
    UnknownRoot { index: usize },
}

/// Fatal error while resolving a chunk into an object graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeserializeError {
    #[error("node id {id:?} occurs at positions {first} and {second}")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },

    #[error("containment cycle: {}", ids.join(" -> "))]
    CyclicContainment { ids: Vec<String> },

    #[error("language {key}@{version} is not registered (used by node {node:?})")]
    MissingLanguage {
        key: String,
        version: String,
        node: Option<String>,
    },

    #[error("node {node:?}: required containment {containment} has no resolvable child")]
    UnresolvedRequiredChild {
        node: String,
        containment: MetaPointer,
    },
}

/// Error while reading or writing the chunk wire form.
#[derive(Debug, Error)]
pub enum ChunkFormatError {
    #[error("malformed chunk JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported serialization format version {version:?}")]
    UnsupportedVersion { version: String },

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),

    #[error("zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Error while constructing an object graph through the application API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node id {id:?} already exists in the graph")]
    DuplicateId { id: String },

    #[error("node {child:?} is already owned by {parent:?}")]
    AlreadyOwned { child: String, parent: String },

    #[error("attaching {child:?} under {parent:?} would create a containment cycle")]
    ContainmentCycle { parent: String, child: String },

    #[error("node handle {index} does not belong to this graph")]
    UnknownNode { index: usize },
}

/// A property value whose text does not follow its primitive type's encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("{found:?} is not a boolean (expected \"true\" or \"false\")")]
    InvalidBoolean { found: String },

    #[error("{found:?} is not a canonical decimal integer")]
    InvalidInteger { found: String },

    #[error("invalid JSON value: {message}")]
    InvalidJson { message: String },

    #[error("{found:?} is not a literal of enumeration {enumeration}")]
    UnknownLiteral { enumeration: String, found: String },
}
