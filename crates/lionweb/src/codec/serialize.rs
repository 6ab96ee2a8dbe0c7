//! Object graph to chunk.
//!
//! Each root's owned subtree is walked once in pre-order: a node, then its
//! containment children slot by slot, then its annotations. References are
//! written as (target id, resolve info) and never followed.

use rustc_hash::FxHashSet;

use crate::chunk::{
    ReferenceTarget, SerializationChunk, SerializedContainment, SerializedNode,
    SerializedProperty, SerializedReference,
};
use crate::codec::value::encode_value;
use crate::error::SerializationError;
use crate::graph::{Graph, Node, NodeIndex};
use crate::language::{LanguageRef, LanguageRegistry, MetaPointer};

/// Options for serializing graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Put the resulting chunk into canonical order.
    ///
    /// See [`SerializationChunk::canonicalize`]. Node order then no longer
    /// reflects traversal order.
    pub canonical: bool,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical() -> Self {
        Self { canonical: true }
    }
}

/// Serializes the subtrees under `roots`.
pub fn serialize(
    graph: &Graph,
    roots: &[NodeIndex],
    registry: &LanguageRegistry,
) -> Result<SerializationChunk, SerializationError> {
    serialize_with_options(graph, roots, registry, SerializeOptions::default())
}

/// Serializes every root of the graph.
pub fn serialize_graph(
    graph: &Graph,
    registry: &LanguageRegistry,
) -> Result<SerializationChunk, SerializationError> {
    serialize(graph, &graph.roots(), registry)
}

pub fn serialize_with_options(
    graph: &Graph,
    roots: &[NodeIndex],
    registry: &LanguageRegistry,
    options: SerializeOptions,
) -> Result<SerializationChunk, SerializationError> {
    log::debug!(roots = roots.len(), nodes = graph.len(); "Serializing graph");

    let mut writer = ChunkWriter {
        graph,
        registry,
        visited: vec![false; graph.len()],
        languages: Vec::new(),
        seen_languages: FxHashSet::default(),
        chunk: SerializationChunk::new(),
    };

    if let Some(unknown) = roots.iter().find(|&&root| graph.node(root).is_none()) {
        return Err(SerializationError::UnknownRoot {
            index: unknown.index(),
        });
    }

    // A root inside another root's subtree is written by that walk.
    let requested: FxHashSet<NodeIndex> = roots.iter().copied().collect();
    for &root in roots {
        if writer.visited[root.index()] || graph.ancestors(root).any(|a| requested.contains(&a)) {
            log::trace!(node = graph[root].id(); "Root is part of another requested subtree");
            continue;
        }
        writer.write_subtree(root)?;
    }

    let ChunkWriter {
        mut chunk,
        languages,
        ..
    } = writer;
    chunk.languages = languages;
    if options.canonical {
        chunk.canonicalize();
    }

    log::debug!(nodes = chunk.nodes.len(), languages = chunk.languages.len(); "Serialized graph");
    Ok(chunk)
}

struct ChunkWriter<'a> {
    graph: &'a Graph,
    registry: &'a LanguageRegistry,
    visited: Vec<bool>,
    languages: Vec<LanguageRef>,
    seen_languages: FxHashSet<LanguageRef>,
    chunk: SerializationChunk,
}

impl ChunkWriter<'_> {
    fn write_subtree(&mut self, root: NodeIndex) -> Result<(), SerializationError> {
        let graph = self.graph;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = &graph[current];
            if self.visited[current.index()] {
                return Err(SerializationError::ContainmentCycle {
                    node: node.id().to_string(),
                });
            }
            self.visited[current.index()] = true;

            let serialized = self.write_node(node)?;
            self.chunk.nodes.push(serialized);

            let owned: Vec<NodeIndex> = node.owned().collect();
            stack.extend(owned.into_iter().rev());
        }
        Ok(())
    }

    fn write_node(&mut self, node: &Node) -> Result<SerializedNode, SerializationError> {
        let classifier = node.classifier();
        if !self
            .registry
            .entity(classifier)
            .is_some_and(|e| e.is_classifier())
        {
            return Err(SerializationError::UnknownClassifier {
                node: node.id().to_string(),
                classifier: classifier.clone(),
            });
        }
        self.use_language(classifier);

        let graph = self.graph;
        let mut serialized = SerializedNode::new(node.id(), classifier.clone());

        for slot in node.properties() {
            self.use_language(&slot.property);
            serialized.properties.push(SerializedProperty {
                property: slot.property.clone(),
                value: slot.value.as_ref().map(encode_value),
            });
        }

        for slot in node.containments() {
            self.use_language(&slot.containment);
            let mut children = Vec::with_capacity(slot.children.len());
            for child in &slot.children {
                match child {
                    Some(child) => children.push(graph[*child].id().to_string()),
                    None => log::warn!(
                        node = node.id(),
                        containment = slot.containment.key.as_str();
                        "Skipping unresolved child placeholder"
                    ),
                }
            }
            serialized.containments.push(SerializedContainment {
                containment: slot.containment.clone(),
                children,
            });
        }

        for slot in node.references() {
            self.use_language(&slot.reference);
            serialized.references.push(SerializedReference {
                reference: slot.reference.clone(),
                targets: slot
                    .targets
                    .iter()
                    .map(|t| ReferenceTarget {
                        resolve_info: t.resolve_info.clone(),
                        reference: t.target.clone(),
                    })
                    .collect(),
            });
        }

        serialized.annotations = node
            .annotations()
            .iter()
            .map(|&a| graph[a].id().to_string())
            .collect();

        serialized.parent = match node.parent() {
            Some(parent) => Some(graph[parent].id().to_string()),
            None => node.declared_parent().map(str::to_string),
        };

        Ok(serialized)
    }

    fn use_language(&mut self, pointer: &MetaPointer) {
        let language = pointer.language_ref();
        if self.seen_languages.insert(language.clone()) {
            self.languages.push(language);
        }
    }
}
