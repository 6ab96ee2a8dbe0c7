//! LionWeb serialization chunks: schema model, graph resolution, validation
//! and structural diffing.
//!
//! A chunk is the flat, id-addressed wire form of a model. This crate turns
//! chunks into arena-backed object graphs and back, checks them against a
//! set of languages and compares two chunks node by node.
//!
//! # Quick Start
//!
//! ```rust
//! use lionweb::language::{builtins, LanguageBuilder, LanguageRegistry, Multiplicity};
//! use lionweb::{decode_chunk_str, deserialize, validate};
//!
//! let files = LanguageBuilder::new("Files", "files", "1")
//!     .concept("Folder", |c| c.containment("items", "File", Multiplicity::ZeroOrMore))
//!     .concept("File", |c| c.optional_property("size", builtins::integer()))
//!     .build()
//!     .unwrap();
//! let registry = LanguageRegistry::new([files]).unwrap();
//!
//! let chunk = decode_chunk_str(r#"{
//!     "serializationFormatVersion": "2023.1",
//!     "languages": [{"key": "files", "version": "1"}],
//!     "nodes": [
//!         {"id": "n1", "classifier": {"language": "files", "version": "1", "key": "files-Folder"},
//!          "containments": [{"containment": {"language": "files", "version": "1", "key": "files-Folder-items"},
//!                            "children": ["n2"]}]},
//!         {"id": "n2", "classifier": {"language": "files", "version": "1", "key": "files-File"},
//!          "parent": "n1"}
//!     ]
//! }"#).unwrap();
//!
//! assert!(!validate(&chunk, &registry).has_errors());
//!
//! let resolved = deserialize(&chunk, &registry).unwrap();
//! let roots = resolved.roots();
//! assert_eq!(resolved.graph[roots[0]].id(), "n1");
//! ```
//!
//! # Modules
//!
//! - [`language`]: Languages, the registry and key/id strategies
//! - [`chunk`]: The serialization chunk data model
//! - [`graph`]: The resolved object graph
//! - [`codec`]: Serializer, deserializer and the JSON/zstd wire form
//! - [`validate`]: Schema conformance checks on raw chunks
//! - [`diff`]: Structural diff between chunks
//! - [`error`]: Fatal error types
//! - [`issue`]: Non-fatal diagnostics
//! - [`limits`]: Format versions and decoding limits
//!
//! # Failure Model
//!
//! Duplicate ids, containment cycles and missing languages make a chunk
//! uninterpretable and abort deserialization. Everything else (dangling
//! children or references, malformed values, aliasing) is reported as an
//! [`Issue`] next to the partial result.

pub mod chunk;
pub mod codec;
pub mod diff;
pub mod error;
pub mod graph;
pub mod issue;
pub mod language;
pub mod limits;
pub mod validate;

// Re-export commonly used types at crate root
pub use chunk::{
    ReferenceTarget, SerializationChunk, SerializedContainment, SerializedNode,
    SerializedProperty, SerializedReference,
};
pub use codec::{
    decode_chunk, decode_chunk_str, deserialize, deserialize_with_options, encode_chunk,
    encode_chunk_compressed, encode_chunk_pretty, serialize, serialize_graph,
    serialize_with_options, DeserializeOptions, Deserialized, SerializeOptions,
};
pub use diff::{diff, Change, ChangeKind};
pub use error::{
    ChunkFormatError, DeserializeError, GraphError, SchemaError, SerializationError, ValueError,
};
pub use graph::{Graph, Node, NodeIndex, PropertyValue, ReferenceValue};
pub use issue::{Issue, IssueKind, Severity};
pub use language::{Language, LanguageRef, LanguageRegistry, MetaPointer};
pub use validate::{validate, validate_with_options, ValidateOptions, ValidationReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
