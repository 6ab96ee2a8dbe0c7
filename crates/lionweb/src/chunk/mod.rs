//! The flat, id-addressed wire form of a model.
//!
//! A chunk lists every node once; parent/child structure lives only in
//! child-id lists and `parent` fields, so one chunk can hold a forest.

pub mod node;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::language::LanguageRef;
use crate::limits::DEFAULT_FORMAT_VERSION;

pub use node::{
    ReferenceTarget, SerializedContainment, SerializedNode, SerializedProperty,
    SerializedReference,
};

/// A serialization chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationChunk {
    pub serialization_format_version: String,
    #[serde(default)]
    pub languages: Vec<LanguageRef>,
    #[serde(default)]
    pub nodes: Vec<SerializedNode>,
}

impl Default for SerializationChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializationChunk {
    /// Creates an empty chunk with the default format version.
    pub fn new() -> Self {
        Self {
            serialization_format_version: DEFAULT_FORMAT_VERSION.to_string(),
            languages: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: LanguageRef) -> Self {
        self.languages.push(language);
        self
    }

    pub fn with_node(mut self, node: SerializedNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// First node with the given id.
    pub fn node(&self, id: &str) -> Option<&SerializedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn declares_language(&self, language: &LanguageRef) -> bool {
        self.languages.contains(language)
    }

    /// Maps each id to the position of its first occurrence.
    pub fn index(&self) -> FxHashMap<&str, usize> {
        let mut index = FxHashMap::with_capacity_and_hasher(self.nodes.len(), Default::default());
        for (position, node) in self.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(position);
        }
        index
    }

    /// Puts the chunk into canonical order.
    ///
    /// Languages are sorted and deduplicated, nodes are sorted by id and
    /// feature slots by meta-pointer. Child lists, reference targets and
    /// annotation lists keep their order since it carries meaning.
    pub fn canonicalize(&mut self) {
        self.languages.sort();
        self.languages.dedup();
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for node in &mut self.nodes {
            node.canonicalize();
        }
    }

    /// Consuming form of [`canonicalize`](Self::canonicalize).
    pub fn into_canonical(mut self) -> Self {
        self.canonicalize();
        self
    }
}
