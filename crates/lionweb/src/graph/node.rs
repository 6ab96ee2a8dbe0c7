//! Nodes of the resolved object graph.

use crate::graph::{NodeIndex, PropertyValue, ReferenceValue};
use crate::language::MetaPointer;

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySlot {
    pub property: MetaPointer,
    pub value: Option<PropertyValue>,
}

/// Owned children of one containment. `None` marks a child that could not
/// be resolved; positions are never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainmentSlot {
    pub containment: MetaPointer,
    pub children: Vec<Option<NodeIndex>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSlot {
    pub reference: MetaPointer,
    pub targets: Vec<ReferenceValue>,
}

/// A node owned by at most one parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    classifier: MetaPointer,
    pub(crate) parent: Option<NodeIndex>,
    /// Parent id named by the input when that parent is not in the graph.
    pub(crate) declared_parent: Option<String>,
    pub(crate) properties: Vec<PropertySlot>,
    pub(crate) containments: Vec<ContainmentSlot>,
    pub(crate) references: Vec<ReferenceSlot>,
    pub(crate) annotations: Vec<NodeIndex>,
}

impl Node {
    pub(crate) fn new(id: String, classifier: MetaPointer) -> Self {
        Self {
            id,
            classifier,
            parent: None,
            declared_parent: None,
            properties: Vec::new(),
            containments: Vec::new(),
            references: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn classifier(&self) -> &MetaPointer {
        &self.classifier
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn declared_parent(&self) -> Option<&str> {
        self.declared_parent.as_deref()
    }

    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    pub fn property(&self, property: &MetaPointer) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.property == *property)
            .and_then(|p| p.value.as_ref())
    }

    pub fn containments(&self) -> &[ContainmentSlot] {
        &self.containments
    }

    pub fn children(&self, containment: &MetaPointer) -> &[Option<NodeIndex>] {
        self.containments
            .iter()
            .find(|c| c.containment == *containment)
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn references(&self) -> &[ReferenceSlot] {
        &self.references
    }

    pub fn targets(&self, reference: &MetaPointer) -> &[ReferenceValue] {
        self.references
            .iter()
            .find(|r| r.reference == *reference)
            .map(|r| r.targets.as_slice())
            .unwrap_or(&[])
    }

    pub fn annotations(&self) -> &[NodeIndex] {
        &self.annotations
    }

    pub(crate) fn set_property(&mut self, property: MetaPointer, value: Option<PropertyValue>) {
        match self.properties.iter_mut().find(|p| p.property == property) {
            Some(slot) => slot.value = value,
            None => self.properties.push(PropertySlot { property, value }),
        }
    }

    pub(crate) fn containment_slot(&mut self, containment: &MetaPointer) -> &mut ContainmentSlot {
        let position = match self
            .containments
            .iter()
            .position(|c| c.containment == *containment)
        {
            Some(position) => position,
            None => {
                self.containments.push(ContainmentSlot {
                    containment: containment.clone(),
                    children: Vec::new(),
                });
                self.containments.len() - 1
            }
        };
        &mut self.containments[position]
    }

    pub(crate) fn reference_slot(&mut self, reference: &MetaPointer) -> &mut ReferenceSlot {
        let position = match self
            .references
            .iter()
            .position(|r| r.reference == *reference)
        {
            Some(position) => position,
            None => {
                self.references.push(ReferenceSlot {
                    reference: reference.clone(),
                    targets: Vec::new(),
                });
                self.references.len() - 1
            }
        };
        &mut self.references[position]
    }

    /// Every owned handle: containment children in slot order, then annotations.
    pub fn owned(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.containments
            .iter()
            .flat_map(|c| c.children.iter().flatten().copied())
            .chain(self.annotations.iter().copied())
    }
}
