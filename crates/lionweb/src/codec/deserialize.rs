//! Chunk to object graph.
//!
//! Resolution runs in three strictly ordered passes:
//!
//! 1. **Index**: id -> position map, duplicate ids, language availability.
//! 2. **Instantiate**: one arena node per serialized node, properties
//!    decoded from their text form.
//! 3. **Link**: containments, annotations and references are wired by id
//!    lookup. Parents are assigned first-claim-wins.
//!
//! Containment cycles are detected once linking is complete. Everything
//! short of a duplicate id, a cycle or a missing language degrades into an
//! [`Issue`] on the result.

use rustc_hash::FxHashMap;

use crate::chunk::{ReferenceTarget, SerializationChunk, SerializedNode};
use crate::codec::value::{decode_value, value_type};
use crate::error::DeserializeError;
use crate::graph::{Graph, Node, NodeIndex, PropertyValue, ReferenceValue};
use crate::issue::{has_errors, Issue, IssueKind, Severity};
use crate::language::{Entity, LanguageRegistry, MetaPointer};

/// Options for resolving chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializeOptions {
    /// Skip nodes whose language is not registered instead of failing.
    pub lenient: bool,
    /// Fail when a required containment has entries but none resolve.
    pub fail_on_unresolved_required_child: bool,
    /// Report dangling reference targets as errors instead of warnings.
    pub dangling_references_are_errors: bool,
}

impl DeserializeOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    /// Partial mode for inspecting models with missing languages.
    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::default()
        }
    }
}

/// A resolved graph together with the non-fatal issues found on the way.
#[derive(Debug, Clone)]
pub struct Deserialized {
    pub graph: Graph,
    pub issues: Vec<Issue>,
}

impl Deserialized {
    /// Parentless nodes in first-encounter order.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph.roots()
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.issues)
    }
}

/// Resolves a chunk with strict options.
pub fn deserialize(
    chunk: &SerializationChunk,
    registry: &LanguageRegistry,
) -> Result<Deserialized, DeserializeError> {
    deserialize_with_options(chunk, registry, DeserializeOptions::default())
}

pub fn deserialize_with_options(
    chunk: &SerializationChunk,
    registry: &LanguageRegistry,
    options: DeserializeOptions,
) -> Result<Deserialized, DeserializeError> {
    log::debug!(nodes = chunk.nodes.len(), lenient = options.lenient; "Deserializing chunk");

    let mut issues = Vec::new();

    // Pass 1
    let index = index_nodes(chunk)?;
    let skipped = check_languages(chunk, registry, options, &mut issues)?;

    // Pass 2
    let mut graph = Graph::new();
    let mut handles = Vec::with_capacity(chunk.nodes.len());
    for (serialized, skip) in chunk.nodes.iter().zip(&skipped) {
        if *skip {
            handles.push(None);
        } else {
            handles.push(Some(instantiate(&mut graph, serialized, registry, &mut issues)));
        }
    }

    // Pass 3
    let mut linker = Linker {
        registry,
        options,
        index,
        handles,
        graph,
        issues,
    };
    for (position, serialized) in chunk.nodes.iter().enumerate() {
        let Some(handle) = linker.handles[position] else {
            continue;
        };
        linker.link_containments(handle, serialized)?;
        linker.link_annotations(handle, serialized);
        linker.link_references(handle, serialized);
    }
    linker.check_declared_parents();

    let Linker { graph, issues, .. } = linker;
    check_cycles(&graph)?;

    log::debug!(nodes = graph.len(), issues = issues.len(); "Deserialized chunk");
    Ok(Deserialized { graph, issues })
}

// =============================================================================
// Pass 1: index
// =============================================================================

fn index_nodes(chunk: &SerializationChunk) -> Result<FxHashMap<&str, usize>, DeserializeError> {
    let mut index = FxHashMap::with_capacity_and_hasher(chunk.nodes.len(), Default::default());
    for (position, node) in chunk.nodes.iter().enumerate() {
        if let Some(&first) = index.get(node.id.as_str()) {
            return Err(DeserializeError::DuplicateId {
                id: node.id.clone(),
                first,
                second: position,
            });
        }
        index.insert(node.id.as_str(), position);
    }
    Ok(index)
}

/// Returns, per node position, whether the node is skipped.
fn check_languages(
    chunk: &SerializationChunk,
    registry: &LanguageRegistry,
    options: DeserializeOptions,
    issues: &mut Vec<Issue>,
) -> Result<Vec<bool>, DeserializeError> {
    for language in &chunk.languages {
        if registry.has_language(language) {
            continue;
        }
        if !options.lenient {
            return Err(DeserializeError::MissingLanguage {
                key: language.key.clone(),
                version: language.version.clone(),
                node: None,
            });
        }
        log::warn!(
            key = language.key.as_str(),
            version = language.version.as_str();
            "Chunk declares a language that is not registered"
        );
    }

    let mut skipped = vec![false; chunk.nodes.len()];
    for (position, node) in chunk.nodes.iter().enumerate() {
        let language = node.classifier.language_ref();
        if registry.has_language(&language) {
            continue;
        }
        if !options.lenient {
            return Err(DeserializeError::MissingLanguage {
                key: language.key,
                version: language.version,
                node: Some(node.id.clone()),
            });
        }
        log::warn!(node = node.id.as_str(); "Skipping node of unregistered language");
        issues.push(Issue::warning(
            IssueKind::SkippedNode,
            &node.id,
            format!("skipped because language {language} is not registered"),
        ));
        skipped[position] = true;
    }
    Ok(skipped)
}

// =============================================================================
// Pass 2: instantiate
// =============================================================================

fn instantiate(
    graph: &mut Graph,
    serialized: &SerializedNode,
    registry: &LanguageRegistry,
    issues: &mut Vec<Issue>,
) -> NodeIndex {
    let classifier = &serialized.classifier;
    let mut node = Node::new(serialized.id.clone(), classifier.clone());
    node.declared_parent = serialized.parent.clone();

    let known = registry.entity(classifier).is_some_and(Entity::is_classifier);
    if !known {
        issues.push(Issue::error(
            IssueKind::UnknownClassifier,
            &serialized.id,
            format!("classifier {classifier} is not defined"),
        ));
    }

    for property in &serialized.properties {
        let Some(text) = &property.value else {
            node.set_property(property.property.clone(), None);
            continue;
        };

        let feature = if known {
            registry.feature_of(classifier, &property.property)
        } else {
            None
        };
        let value = match feature {
            Some(feature) if feature.is_property() => match value_type(registry, feature.ty()) {
                Some(ty) => match decode_value(text, ty) {
                    Ok(value) => value,
                    Err(e) => {
                        log::trace!(node = serialized.id.as_str(); "Leaving malformed property unset");
                        issues.push(Issue::error(
                            IssueKind::MalformedValue,
                            &serialized.id,
                            format!("property {}: {e}", property.property),
                        ));
                        continue;
                    }
                },
                None => PropertyValue::Raw(text.clone()),
            },
            Some(feature) => {
                issues.push(Issue::warning(
                    IssueKind::FeatureKindMismatch,
                    &serialized.id,
                    format!(
                        "{} is a {}, but is used as a property",
                        property.property,
                        feature.kind_name()
                    ),
                ));
                PropertyValue::Raw(text.clone())
            }
            None => {
                if known {
                    issues.push(Issue::warning(
                        IssueKind::UnknownFeature,
                        &serialized.id,
                        format!("property {} is not defined on {classifier}", property.property),
                    ));
                }
                PropertyValue::Raw(text.clone())
            }
        };
        node.set_property(property.property.clone(), Some(value));
    }

    graph.push_node(node)
}

// =============================================================================
// Pass 3: link
// =============================================================================

struct Linker<'a> {
    registry: &'a LanguageRegistry,
    options: DeserializeOptions,
    index: FxHashMap<&'a str, usize>,
    handles: Vec<Option<NodeIndex>>,
    graph: Graph,
    issues: Vec<Issue>,
}

impl Linker<'_> {
    fn lookup(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).and_then(|&position| self.handles[position])
    }

    fn link_containments(
        &mut self,
        parent: NodeIndex,
        serialized: &SerializedNode,
    ) -> Result<(), DeserializeError> {
        for slot in &serialized.containments {
            let mut children = Vec::with_capacity(slot.children.len());
            for child in &slot.children {
                children.push(self.claim(parent, &serialized.id, child, IssueKind::UnresolvedChild));
            }

            let unresolved = !children.is_empty() && children.iter().all(Option::is_none);
            if unresolved && self.is_required(&serialized.classifier, &slot.containment) {
                if self.options.fail_on_unresolved_required_child {
                    return Err(DeserializeError::UnresolvedRequiredChild {
                        node: serialized.id.clone(),
                        containment: slot.containment.clone(),
                    });
                }
                log::trace!(node = serialized.id.as_str(); "Required containment has no resolvable child");
            }

            self.graph
                .node_mut(parent)
                .containment_slot(&slot.containment)
                .children
                .extend(children);
        }
        Ok(())
    }

    fn link_annotations(&mut self, owner: NodeIndex, serialized: &SerializedNode) {
        for annotation in &serialized.annotations {
            if let Some(handle) =
                self.claim(owner, &serialized.id, annotation, IssueKind::UnresolvedAnnotation)
            {
                self.graph.node_mut(owner).annotations.push(handle);
            }
        }
    }

    fn link_references(&mut self, node: NodeIndex, serialized: &SerializedNode) {
        let severity = if self.options.dangling_references_are_errors {
            Severity::Error
        } else {
            Severity::Warning
        };

        for slot in &serialized.references {
            let mut targets = Vec::with_capacity(slot.targets.len());
            for ReferenceTarget {
                resolve_info,
                reference,
            } in &slot.targets
            {
                let target = match reference {
                    Some(id) if self.lookup(id).is_none() => {
                        self.issues.push(
                            Issue::new(
                                severity,
                                IssueKind::UnresolvedReference,
                                &serialized.id,
                                format!("reference {} targets {id:?}, which is not in the chunk", slot.reference),
                            )
                            .with_related(id),
                        );
                        None
                    }
                    other => other.clone(),
                };
                targets.push(ReferenceValue {
                    target,
                    resolve_info: resolve_info.clone(),
                });
            }

            self.graph
                .node_mut(node)
                .reference_slot(&slot.reference)
                .targets
                .extend(targets);
        }
    }

    /// Makes `child_id` owned by `parent`. `None` if it cannot be.
    fn claim(
        &mut self,
        parent: NodeIndex,
        parent_id: &str,
        child_id: &str,
        missing: IssueKind,
    ) -> Option<NodeIndex> {
        let Some(child) = self.lookup(child_id) else {
            self.issues.push(
                Issue::error(
                    missing,
                    parent_id,
                    format!("{child_id:?} is not in the chunk"),
                )
                .with_related(child_id),
            );
            return None;
        };

        if let Some(owner) = self.graph[child].parent() {
            let owner_id = self.graph[owner].id().to_string();
            self.issues.push(
                Issue::error(
                    IssueKind::MultipleParents,
                    child_id,
                    format!("already owned by {owner_id:?}, also claimed by {parent_id:?}"),
                )
                .with_related(owner_id)
                .with_related(parent_id),
            );
            return None;
        }

        let node = self.graph.node_mut(child);
        node.parent = Some(parent);
        if let Some(declared) = node.declared_parent.take() {
            if declared != parent_id {
                self.issues.push(
                    Issue::warning(
                        IssueKind::ParentMismatch,
                        child_id,
                        format!("declares parent {declared:?} but is owned by {parent_id:?}"),
                    )
                    .with_related(declared)
                    .with_related(parent_id),
                );
            }
        }
        Some(child)
    }

    /// Reports nodes that name a parent which did not claim them.
    fn check_declared_parents(&mut self) {
        for (_, node) in self.graph.nodes() {
            if node.parent().is_some() {
                continue;
            }
            let Some(declared) = node.declared_parent() else {
                continue;
            };
            let issue = if self.lookup(declared).is_some() {
                Issue::warning(
                    IssueKind::ParentMismatch,
                    node.id(),
                    format!("declares parent {declared:?}, which does not contain it"),
                )
            } else {
                Issue::warning(
                    IssueKind::UnresolvedParent,
                    node.id(),
                    format!("declared parent {declared:?} is not in the chunk"),
                )
            };
            self.issues.push(issue.with_related(declared));
        }
    }

    fn is_required(&self, classifier: &MetaPointer, containment: &MetaPointer) -> bool {
        self.registry
            .feature_of(classifier, containment)
            .is_some_and(|f| f.is_containment() && !f.optional)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Walks every parent chain once; a chain that reaches itself is a cycle.
fn check_cycles(graph: &Graph) -> Result<(), DeserializeError> {
    let mut state = vec![Visit::New; graph.len()];
    for (start, _) in graph.nodes() {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            match state[index.index()] {
                Visit::Done => break,
                Visit::OnPath => {
                    let from = path.iter().position(|&i| i == index).unwrap_or(0);
                    let ids = path[from..]
                        .iter()
                        .rev()
                        .map(|&i| graph[i].id().to_string())
                        .collect();
                    return Err(DeserializeError::CyclicContainment { ids });
                }
                Visit::New => {
                    state[index.index()] = Visit::OnPath;
                    path.push(index);
                    current = graph[index].parent();
                }
            }
        }
        for index in path {
            state[index.index()] = Visit::Done;
        }
    }
    Ok(())
}
