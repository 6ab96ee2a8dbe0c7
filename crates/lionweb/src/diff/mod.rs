//! Structural diff between two chunks.
//!
//! Nodes are matched by id and compared slot by slot. No schema is needed;
//! features are identified by meta-pointer equality alone. A null property
//! value is the same as an absent property and an absent link slot is the
//! same as an empty one.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::chunk::{ReferenceTarget, SerializationChunk, SerializedNode};
use crate::language::MetaPointer;

/// Kind of a [`Change`], in reporting priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Added,
    Removed,
    ClassifierChanged,
    PropertyChanged,
    ContainmentChanged,
    ReferenceChanged,
    AnnotationsChanged,
}

/// One difference between two chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The node exists only in the second chunk.
    Added { id: String, classifier: MetaPointer },
    /// The node exists only in the first chunk.
    Removed { id: String, classifier: MetaPointer },
    /// Supersedes all other changes for the node.
    ClassifierChanged {
        id: String,
        before: MetaPointer,
        after: MetaPointer,
    },
    PropertyChanged {
        id: String,
        property: MetaPointer,
        before: Option<String>,
        after: Option<String>,
    },
    /// Reported once per slot, whatever the number of moved entries.
    ContainmentChanged {
        id: String,
        containment: MetaPointer,
        before: Vec<String>,
        after: Vec<String>,
    },
    ReferenceChanged {
        id: String,
        reference: MetaPointer,
        before: Vec<ReferenceTarget>,
        after: Vec<ReferenceTarget>,
    },
    AnnotationsChanged {
        id: String,
        before: Vec<String>,
        after: Vec<String>,
    },
}

impl Change {
    /// Id of the node the change belongs to.
    pub fn id(&self) -> &str {
        match self {
            Change::Added { id, .. }
            | Change::Removed { id, .. }
            | Change::ClassifierChanged { id, .. }
            | Change::PropertyChanged { id, .. }
            | Change::ContainmentChanged { id, .. }
            | Change::ReferenceChanged { id, .. }
            | Change::AnnotationsChanged { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Added { .. } => ChangeKind::Added,
            Change::Removed { .. } => ChangeKind::Removed,
            Change::ClassifierChanged { .. } => ChangeKind::ClassifierChanged,
            Change::PropertyChanged { .. } => ChangeKind::PropertyChanged,
            Change::ContainmentChanged { .. } => ChangeKind::ContainmentChanged,
            Change::ReferenceChanged { .. } => ChangeKind::ReferenceChanged,
            Change::AnnotationsChanged { .. } => ChangeKind::AnnotationsChanged,
        }
    }

    /// The same change seen from the other side.
    pub fn inverse(self) -> Change {
        match self {
            Change::Added { id, classifier } => Change::Removed { id, classifier },
            Change::Removed { id, classifier } => Change::Added { id, classifier },
            Change::ClassifierChanged { id, before, after } => Change::ClassifierChanged {
                id,
                before: after,
                after: before,
            },
            Change::PropertyChanged {
                id,
                property,
                before,
                after,
            } => Change::PropertyChanged {
                id,
                property,
                before: after,
                after: before,
            },
            Change::ContainmentChanged {
                id,
                containment,
                before,
                after,
            } => Change::ContainmentChanged {
                id,
                containment,
                before: after,
                after: before,
            },
            Change::ReferenceChanged {
                id,
                reference,
                before,
                after,
            } => Change::ReferenceChanged {
                id,
                reference,
                before: after,
                after: before,
            },
            Change::AnnotationsChanged { id, before, after } => Change::AnnotationsChanged {
                id,
                before: after,
                after: before,
            },
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added { id, classifier } => write!(f, "+ {id} ({classifier})"),
            Change::Removed { id, classifier } => write!(f, "- {id} ({classifier})"),
            Change::ClassifierChanged { id, before, after } => {
                write!(f, "~ {id}: classifier {before} -> {after}")
            }
            Change::PropertyChanged {
                id,
                property,
                before,
                after,
            } => write!(
                f,
                "~ {id}: {} {} -> {}",
                property.key,
                Value(before.as_deref()),
                Value(after.as_deref())
            ),
            Change::ContainmentChanged {
                id,
                containment,
                before,
                after,
            } => write!(
                f,
                "~ {id}: {} [{}] -> [{}]",
                containment.key,
                before.join(", "),
                after.join(", ")
            ),
            Change::ReferenceChanged {
                id,
                reference,
                before,
                after,
            } => write!(
                f,
                "~ {id}: {} [{}] -> [{}]",
                reference.key,
                Targets(before),
                Targets(after)
            ),
            Change::AnnotationsChanged { id, before, after } => write!(
                f,
                "~ {id}: annotations [{}] -> [{}]",
                before.join(", "),
                after.join(", ")
            ),
        }
    }
}

struct Value<'a>(Option<&'a str>);

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:?}"),
            None => f.write_str("null"),
        }
    }
}

struct Targets<'a>(&'a [ReferenceTarget]);

impl fmt::Display for Targets<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, target) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(target.reference.as_deref().unwrap_or("null"))?;
            if let Some(info) = &target.resolve_info {
                write!(f, " ({info})")?;
            }
        }
        Ok(())
    }
}

/// Computes the changes that turn `a` into `b`.
///
/// Changes are grouped by node id in first-seen order across `a` then `b`,
/// and ordered by [`ChangeKind`] within a node. When an id occurs more than
/// once in a chunk, its first occurrence is compared.
pub fn diff(a: &SerializationChunk, b: &SerializationChunk) -> Vec<Change> {
    log::debug!(before = a.nodes.len(), after = b.nodes.len(); "Diffing chunks");

    let index_a = a.index();
    let index_b = b.index();
    let mut seen = FxHashSet::default();
    let mut changes = Vec::new();

    for node in a.nodes.iter().chain(&b.nodes) {
        let id = node.id.as_str();
        if !seen.insert(id) {
            continue;
        }
        let before = index_a.get(id).map(|&i| &a.nodes[i]);
        let after = index_b.get(id).map(|&i| &b.nodes[i]);
        match (before, after) {
            (Some(before), Some(after)) => diff_node(before, after, &mut changes),
            (Some(before), None) => changes.push(Change::Removed {
                id: id.to_string(),
                classifier: before.classifier.clone(),
            }),
            (None, Some(after)) => changes.push(Change::Added {
                id: id.to_string(),
                classifier: after.classifier.clone(),
            }),
            (None, None) => {}
        }
    }

    log::debug!(changes = changes.len(); "Diffed chunks");
    changes
}

fn diff_node(a: &SerializedNode, b: &SerializedNode, changes: &mut Vec<Change>) {
    let id = &a.id;
    if a.classifier != b.classifier {
        changes.push(Change::ClassifierChanged {
            id: id.clone(),
            before: a.classifier.clone(),
            after: b.classifier.clone(),
        });
        return;
    }

    let properties = union(
        a.properties.iter().map(|p| &p.property),
        b.properties.iter().map(|p| &p.property),
    );
    for property in properties {
        let before = a.property_value(property);
        let after = b.property_value(property);
        if before != after {
            changes.push(Change::PropertyChanged {
                id: id.clone(),
                property: property.clone(),
                before: before.map(str::to_string),
                after: after.map(str::to_string),
            });
        }
    }

    let containments = union(
        a.containments.iter().map(|c| &c.containment),
        b.containments.iter().map(|c| &c.containment),
    );
    for containment in containments {
        let before = a.children(containment);
        let after = b.children(containment);
        if before != after {
            changes.push(Change::ContainmentChanged {
                id: id.clone(),
                containment: containment.clone(),
                before: before.to_vec(),
                after: after.to_vec(),
            });
        }
    }

    let references = union(
        a.references.iter().map(|r| &r.reference),
        b.references.iter().map(|r| &r.reference),
    );
    for reference in references {
        let before = a.targets(reference);
        let after = b.targets(reference);
        if before != after {
            changes.push(Change::ReferenceChanged {
                id: id.clone(),
                reference: reference.clone(),
                before: before.to_vec(),
                after: after.to_vec(),
            });
        }
    }

    if a.annotations != b.annotations {
        changes.push(Change::AnnotationsChanged {
            id: id.clone(),
            before: a.annotations.clone(),
            after: b.annotations.clone(),
        });
    }
}

/// Distinct pointers in first-seen order.
fn union<'a>(
    a: impl Iterator<Item = &'a MetaPointer>,
    b: impl Iterator<Item = &'a MetaPointer>,
) -> Vec<&'a MetaPointer> {
    let mut seen = FxHashSet::default();
    a.chain(b).filter(|p| seen.insert(*p)).collect()
}
