//! The resolved in-memory object graph.
//!
//! Nodes live in an arena and are addressed by [`NodeIndex`] handles.
//! Containment and annotation edges are the only ownership structure: each
//! node has at most one parent and containment never forms a cycle.
//! References stay non-owning; they hold the target id and are resolved by
//! lookup.

pub mod node;
pub mod value;

use std::ops::Index;

use rustc_hash::FxHashMap;

use crate::error::GraphError;
use crate::language::{IdGenerator, MetaPointer};

pub use node::{ContainmentSlot, Node, PropertySlot, ReferenceSlot};
pub use value::{PropertyValue, ReferenceValue};

/// Handle to a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of nodes indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeIndex>,
}

impl Index<NodeIndex> for Graph {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    /// Handle of the node with the given id.
    pub fn get(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&Node> {
        self.get(id).map(|index| &self[index])
    }

    /// All nodes in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    /// Nodes without a parent in this graph, in allocation order.
    ///
    /// Includes the top nodes of subtree chunks, whose named parent lives
    /// elsewhere.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Roots that name a parent which is not part of this graph.
    pub fn detached(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| n.parent.is_none() && n.declared_parent.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Looks up the target of a reference. `None` if it is null or dangling.
    pub fn resolve(&self, reference: &ReferenceValue) -> Option<NodeIndex> {
        reference.target.as_deref().and_then(|id| self.get(id))
    }

    /// Parent chain from the direct parent up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.node(index).and_then(Node::parent), |&i| {
            self.nodes[i.0].parent
        })
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Adds a parentless node.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        classifier: MetaPointer,
    ) -> Result<NodeIndex, GraphError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateId { id });
        }
        Ok(self.push_node(Node::new(id, classifier)))
    }

    /// Adds a parentless node with an id from the given generator.
    pub fn add_generated_node(
        &mut self,
        ids: &mut dyn IdGenerator,
        seed: Option<&str>,
        classifier: MetaPointer,
    ) -> Result<NodeIndex, GraphError> {
        self.add_node(ids.next_id(seed), classifier)
    }

    /// Sets (or clears, with `None`) a property value.
    pub fn set_property(
        &mut self,
        node: NodeIndex,
        property: MetaPointer,
        value: Option<PropertyValue>,
    ) -> Result<(), GraphError> {
        self.check(node)?;
        self.nodes[node.0].set_property(property, value);
        Ok(())
    }

    /// Appends `child` to a containment of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        containment: MetaPointer,
        child: NodeIndex,
    ) -> Result<(), GraphError> {
        self.claim_ownership(parent, child)?;
        self.nodes[parent.0]
            .containment_slot(&containment)
            .children
            .push(Some(child));
        Ok(())
    }

    /// Attaches `annotation` to `owner`.
    pub fn add_annotation(&mut self, owner: NodeIndex, annotation: NodeIndex) -> Result<(), GraphError> {
        self.claim_ownership(owner, annotation)?;
        self.nodes[owner.0].annotations.push(annotation);
        Ok(())
    }

    /// Appends a reference entry. The target does not have to exist.
    pub fn add_reference(
        &mut self,
        node: NodeIndex,
        reference: MetaPointer,
        value: ReferenceValue,
    ) -> Result<(), GraphError> {
        self.check(node)?;
        self.nodes[node.0].reference_slot(&reference).targets.push(value);
        Ok(())
    }

    fn claim_ownership(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), GraphError> {
        self.check(parent)?;
        self.check(child)?;

        if let Some(owner) = self.nodes[child.0].parent {
            return Err(GraphError::AlreadyOwned {
                child: self.nodes[child.0].id().to_string(),
                parent: self.nodes[owner.0].id().to_string(),
            });
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(GraphError::ContainmentCycle {
                parent: self.nodes[parent.0].id().to_string(),
                child: self.nodes[child.0].id().to_string(),
            });
        }

        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.declared_parent = None;
        Ok(())
    }

    fn check(&self, index: NodeIndex) -> Result<(), GraphError> {
        if index.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode { index: index.0 })
        }
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.index.insert(node.id().to_string(), index);
        self.nodes.push(node);
        index
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0]
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    /// Compares two graphs by node ids, independent of allocation order.
    pub fn structurally_eq(&self, other: &Graph) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let ids = |graph: &Graph, handles: Vec<NodeIndex>| -> Vec<String> {
            handles.into_iter().map(|i| graph[i].id().to_string()).collect()
        };
        if ids(self, self.roots()) != ids(other, other.roots()) {
            return false;
        }

        self.nodes.iter().all(|node| {
            let Some(theirs) = other.by_id(node.id()) else {
                return false;
            };
            let parent_id = |graph: &Graph, n: &Node| n.parent.map(|p| graph[p].id().to_string());
            let slot_ids = |graph: &Graph, slots: &[ContainmentSlot]| -> Vec<(MetaPointer, Vec<Option<String>>)> {
                slots
                    .iter()
                    .map(|slot| {
                        let children = slot
                            .children
                            .iter()
                            .map(|c| c.map(|i| graph[i].id().to_string()))
                            .collect();
                        (slot.containment.clone(), children)
                    })
                    .collect()
            };

            node.classifier() == theirs.classifier()
                && node.declared_parent == theirs.declared_parent
                && parent_id(self, node) == parent_id(other, theirs)
                && node.properties == theirs.properties
                && node.references == theirs.references
                && slot_ids(self, &node.containments) == slot_ids(other, &theirs.containments)
                && ids(self, node.annotations.clone()) == ids(other, theirs.annotations.clone())
        })
    }
}
