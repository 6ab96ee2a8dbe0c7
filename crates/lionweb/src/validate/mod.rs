//! Schema conformance and referential integrity checks on raw chunks.
//!
//! Validation never fails: every check runs for every node and all findings
//! are collected into a [`ValidationReport`]. A chunk conforms when the
//! report holds no error-severity issue.

use rustc_hash::FxHashMap;

use crate::chunk::{SerializationChunk, SerializedNode};
use crate::codec::value::{decode_value, value_type};
use crate::issue::{has_errors, Issue, IssueKind};
use crate::language::{Entity, Feature, FeatureKind, LanguageRegistry, MetaPointer};

/// Options for chunk validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Accept reference targets that are not part of the chunk.
    pub allow_external_references: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for chunks that are a slice of a larger model.
    pub fn partial() -> Self {
        Self {
            allow_external_references: true,
        }
    }
}

/// All issues found in a chunk, in node order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.issues)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Issues attached to the given node.
    pub fn for_node<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.node == id)
    }
}

/// Validates a chunk with default options.
pub fn validate(chunk: &SerializationChunk, registry: &LanguageRegistry) -> ValidationReport {
    validate_with_options(chunk, registry, ValidateOptions::default())
}

pub fn validate_with_options(
    chunk: &SerializationChunk,
    registry: &LanguageRegistry,
    options: ValidateOptions,
) -> ValidationReport {
    log::debug!(nodes = chunk.nodes.len(); "Validating chunk");

    let mut validator = Validator {
        chunk,
        registry,
        options,
        index: chunk.index(),
        owners: FxHashMap::default(),
        issues: Vec::new(),
    };

    validator.check_ids();
    for node in &chunk.nodes {
        validator.check_node(node);
    }

    let report = ValidationReport {
        issues: validator.issues,
    };
    log::debug!(
        issues = report.issues.len(),
        errors = report.errors().count();
        "Validated chunk"
    );
    report
}

struct Validator<'a> {
    chunk: &'a SerializationChunk,
    registry: &'a LanguageRegistry,
    options: ValidateOptions,
    /// Id -> position of the first node with that id.
    index: FxHashMap<&'a str, usize>,
    /// Child or annotation id -> id of the first node that owns it.
    owners: FxHashMap<&'a str, &'a str>,
    issues: Vec<Issue>,
}

impl<'a> Validator<'a> {
    fn node(&self, id: &str) -> Option<&'a SerializedNode> {
        let chunk = self.chunk;
        self.index.get(id).map(|&position| &chunk.nodes[position])
    }

    fn check_ids(&mut self) {
        for (position, node) in self.chunk.nodes.iter().enumerate() {
            let first = self.index[node.id.as_str()];
            if first != position {
                self.issues.push(
                    Issue::error(
                        IssueKind::DuplicateId,
                        &node.id,
                        "id already used by an earlier node",
                    )
                    .with_position(first)
                    .with_position(position),
                );
            }
        }
    }

    fn check_node(&mut self, node: &'a SerializedNode) {
        let classifier = &node.classifier;
        if !self.chunk.declares_language(&classifier.language_ref()) {
            self.issues.push(Issue::warning(
                IssueKind::UndeclaredLanguage,
                &node.id,
                format!(
                    "language {} is not declared in the chunk",
                    classifier.language_ref()
                ),
            ));
        }

        self.check_ownership(node);
        self.check_parent(node);

        let Some(entity) = self.registry.entity(classifier) else {
            self.issues.push(Issue::error(
                IssueKind::UnknownClassifier,
                &node.id,
                format!("classifier {classifier} is not defined"),
            ));
            return;
        };
        if !entity.is_classifier() {
            self.issues.push(Issue::error(
                IssueKind::NotInstantiable,
                &node.id,
                format!("{classifier} is a {}, not a classifier", entity.kind_name()),
            ));
            return;
        }
        if !entity.is_instantiable() {
            let what = match entity {
                Entity::Concept(_) => "an abstract concept",
                _ => "an interface",
            };
            self.issues.push(Issue::error(
                IssueKind::NotInstantiable,
                &node.id,
                format!("{classifier} is {what} and cannot have instances"),
            ));
        }

        self.check_properties(node);
        self.check_containments(node);
        self.check_references(node);
        self.check_annotations(node);
        self.check_required(node);
    }

    /// Looks up a feature used by a node, reporting unknown features and
    /// features of the wrong kind.
    fn used_feature(
        &mut self,
        node: &SerializedNode,
        pointer: &MetaPointer,
        expected: &str,
        is_kind: fn(&Feature) -> bool,
    ) -> Option<&'a Feature> {
        let registry = self.registry;
        let Some(feature) = registry.feature_of(&node.classifier, pointer) else {
            self.issues.push(Issue::error(
                IssueKind::UnknownFeature,
                &node.id,
                format!("{expected} {pointer} is not defined on {}", node.classifier),
            ));
            return None;
        };
        if !is_kind(feature) {
            self.issues.push(Issue::error(
                IssueKind::FeatureKindMismatch,
                &node.id,
                format!(
                    "{pointer} is a {}, but is used as a {expected}",
                    feature.kind_name()
                ),
            ));
            return None;
        }
        Some(feature)
    }

    fn check_arity(&mut self, node: &SerializedNode, pointer: &MetaPointer, feature: &Feature, len: usize) {
        if !feature.is_multiple() && len > 1 {
            self.issues.push(Issue::error(
                IssueKind::ArityViolation,
                &node.id,
                format!("{pointer} is single-valued but has {len} entries"),
            ));
        }
    }

    fn check_properties(&mut self, node: &SerializedNode) {
        for property in &node.properties {
            let Some(feature) =
                self.used_feature(node, &property.property, "property", Feature::is_property)
            else {
                continue;
            };
            let Some(text) = &property.value else {
                continue;
            };
            let Some(ty) = value_type(self.registry, feature.ty()) else {
                continue;
            };
            if let Err(e) = decode_value(text, ty) {
                self.issues.push(Issue::error(
                    IssueKind::MalformedValue,
                    &node.id,
                    format!("property {}: {e}", property.property),
                ));
            }
        }
    }

    fn check_containments(&mut self, node: &SerializedNode) {
        for slot in &node.containments {
            let Some(feature) = self.used_feature(
                node,
                &slot.containment,
                "containment",
                Feature::is_containment,
            ) else {
                continue;
            };
            self.check_arity(node, &slot.containment, feature, slot.children.len());

            for child_id in &slot.children {
                let Some(child) = self.node(child_id) else {
                    self.issues.push(
                        Issue::error(
                            IssueKind::UnresolvedChild,
                            &node.id,
                            format!("child {child_id:?} of {} is not in the chunk", slot.containment),
                        )
                        .with_related(child_id),
                    );
                    continue;
                };
                self.check_child_type(node, child, feature.ty());
            }
        }
    }

    fn check_child_type(&mut self, owner: &SerializedNode, child: &SerializedNode, expected: &MetaPointer) {
        let Some(entity) = self.registry.entity(&child.classifier) else {
            return;
        };
        let partition = matches!(entity, Entity::Concept(c) if c.partition);
        if partition || !self.registry.is_subtype(&child.classifier, expected) {
            self.issues.push(
                Issue::error(
                    IssueKind::IncompatibleChild,
                    &owner.id,
                    format!(
                        "child {:?} has classifier {}, expected {expected}",
                        child.id, child.classifier
                    ),
                )
                .with_related(&child.id),
            );
        }
    }

    fn check_references(&mut self, node: &SerializedNode) {
        for slot in &node.references {
            let Some(feature) =
                self.used_feature(node, &slot.reference, "reference", Feature::is_reference)
            else {
                continue;
            };
            self.check_arity(node, &slot.reference, feature, slot.targets.len());

            if self.options.allow_external_references {
                continue;
            }
            for target in &slot.targets {
                let Some(id) = &target.reference else {
                    continue;
                };
                if self.node(id).is_none() {
                    self.issues.push(
                        Issue::error(
                            IssueKind::UnresolvedReference,
                            &node.id,
                            format!("reference {} targets {id:?}, which is not in the chunk", slot.reference),
                        )
                        .with_related(id),
                    );
                }
            }
        }
    }

    fn check_annotations(&mut self, node: &SerializedNode) {
        for id in &node.annotations {
            let Some(annotation) = self.node(id) else {
                self.issues.push(
                    Issue::error(
                        IssueKind::UnresolvedAnnotation,
                        &node.id,
                        format!("annotation {id:?} is not in the chunk"),
                    )
                    .with_related(id),
                );
                continue;
            };
            let accepts = match self.registry.entity(&annotation.classifier) {
                Some(Entity::Annotation(a)) => a
                    .annotates
                    .as_ref()
                    .is_none_or(|target| self.registry.is_subtype(&node.classifier, target)),
                Some(_) => false,
                None => true,
            };
            if !accepts {
                self.issues.push(
                    Issue::error(
                        IssueKind::IncompatibleChild,
                        &node.id,
                        format!("{id:?} ({}) cannot annotate {}", annotation.classifier, node.classifier),
                    )
                    .with_related(id),
                );
            }
        }
    }

    fn check_required(&mut self, node: &SerializedNode) {
        let registry = self.registry;
        let Some(features) = registry.all_features(&node.classifier) else {
            return;
        };
        for required in features.iter().filter(|f| !f.feature.optional) {
            let present = match &required.feature.kind {
                FeatureKind::Property { .. } => node.property_value(required.pointer).is_some(),
                FeatureKind::Containment { .. } => !node.children(required.pointer).is_empty(),
                FeatureKind::Reference { .. } => !node.targets(required.pointer).is_empty(),
            };
            if !present {
                self.issues.push(Issue::error(
                    IssueKind::MissingRequiredFeature,
                    &node.id,
                    format!(
                        "required {} {:?} ({}) is missing",
                        required.feature.kind_name(),
                        required.feature.name,
                        required.pointer
                    ),
                ));
            }
        }
    }

    /// Every child and annotation may be listed by one node only.
    fn check_ownership(&mut self, node: &'a SerializedNode) {
        for owned in node.owned_ids() {
            match self.owners.get(owned) {
                Some(&first) => self.issues.push(
                    Issue::error(
                        IssueKind::MultipleParents,
                        owned,
                        format!("listed by both {first:?} and {:?}", node.id),
                    )
                    .with_related(first)
                    .with_related(&node.id),
                ),
                None => {
                    self.owners.insert(owned, &node.id);
                }
            }
        }
    }

    /// The parent field must name the node that lists this one.
    fn check_parent(&mut self, node: &SerializedNode) {
        let Some(parent_id) = &node.parent else {
            return;
        };
        let Some(parent) = self.node(parent_id) else {
            return;
        };
        if !parent.owned_ids().any(|id| id == node.id) {
            self.issues.push(
                Issue::warning(
                    IssueKind::ParentMismatch,
                    &node.id,
                    format!("declares parent {parent_id:?}, which does not list it"),
                )
                .with_related(parent_id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ReferenceTarget;
    use crate::language::{builtins, Language, LanguageBuilder, LanguageRef, Multiplicity};

    fn files() -> Language {
        LanguageBuilder::new("Files", "files", "1")
            .concept("Node", |c| c.abstract_concept().implements(builtins::inamed()))
            .concept("Folder", |c| {
                c.extends("Node")
                    .containment("items", "Node", Multiplicity::ZeroOrMore)
            })
            .concept("File", |c| {
                c.extends("Node")
                    .optional_property("size", builtins::integer())
                    .optional_property("kind", "Kind")
                    .reference("link", "File", Multiplicity::Optional)
            })
            .concept("Drive", |c| c.partition())
            .annotation("Note", |a| a.annotates("File"))
            .enumeration("Kind", &["Text", "Binary"])
            .build()
            .unwrap()
    }

    fn ptr(key: &str) -> MetaPointer {
        MetaPointer::new("files", "1", key)
    }

    fn named(id: &str, classifier: &str) -> SerializedNode {
        SerializedNode::new(id, ptr(classifier)).with_property(builtins::inamed_name(), id)
    }

    fn chunk(nodes: Vec<SerializedNode>) -> SerializationChunk {
        let mut chunk = SerializationChunk::new()
            .with_language(LanguageRef::new("files", "1"))
            .with_language(builtins::BUILTINS.reference());
        chunk.nodes = nodes;
        chunk
    }

    fn check(chunk: &SerializationChunk) -> ValidationReport {
        let registry = LanguageRegistry::new([files()]).unwrap();
        validate(chunk, &registry)
    }

    fn kinds(report: &ValidationReport) -> Vec<IssueKind> {
        report.issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_conformant_chunk() {
        let chunk = chunk(vec![
            named("root", "files-Folder").with_children(ptr("files-Folder-items"), ["a"]),
            named("a", "files-File")
                .with_property(ptr("files-File-size"), "12")
                .with_property(ptr("files-File-kind"), "files-Kind-Text")
                .with_targets(ptr("files-File-link"), [ReferenceTarget::to("a")])
                .with_annotation("note")
                .with_parent("root"),
            SerializedNode::new("note", ptr("files-Note")).with_parent("a"),
        ]);
        let report = check(&chunk);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_all_checks_are_collected() {
        let chunk = chunk(vec![
            named("root", "files-Folder")
                .with_children(ptr("files-Folder-items"), ["a", "ghost"])
                .with_property(ptr("files-File-size"), "1"),
            named("a", "files-File")
                .with_property(ptr("files-File-size"), "1.5")
                .with_targets(ptr("files-File-link"), [ReferenceTarget::to("x"), ReferenceTarget::to("y")])
                .with_parent("root"),
        ]);
        let report = check(&chunk);
        assert_eq!(
            kinds(&report),
            [
                IssueKind::UnknownFeature,
                IssueKind::UnresolvedChild,
                IssueKind::MalformedValue,
                IssueKind::ArityViolation,
                IssueKind::UnresolvedReference,
                IssueKind::UnresolvedReference,
            ]
        );
        assert!(report.issues.iter().all(|i| i.is_error()));
        assert_eq!(report.for_node("a").count(), 4);
    }

    #[test]
    fn test_external_references_allowed_by_option() {
        let chunk = chunk(vec![
            named("a", "files-File").with_targets(ptr("files-File-link"), [ReferenceTarget::to("x")]),
        ]);
        let registry = LanguageRegistry::new([files()]).unwrap();
        assert!(validate(&chunk, &registry).has_errors());
        assert!(!validate_with_options(&chunk, &registry, ValidateOptions::partial()).has_errors());
    }

    #[test]
    fn test_missing_required_name() {
        let chunk = chunk(vec![SerializedNode::new("a", ptr("files-File"))]);
        let report = check(&chunk);
        assert_eq!(kinds(&report), [IssueKind::MissingRequiredFeature]);
        assert!(report.issues[0].message.contains("\"name\""));
    }

    #[test]
    fn test_duplicate_ids_and_aliasing() {
        let chunk = chunk(vec![
            named("p", "files-Folder").with_children(ptr("files-Folder-items"), ["c"]),
            named("q", "files-Folder").with_children(ptr("files-Folder-items"), ["c"]),
            named("c", "files-File").with_parent("p"),
            named("c", "files-File"),
        ]);
        let report = check(&chunk);
        assert_eq!(
            kinds(&report),
            [IssueKind::DuplicateId, IssueKind::MultipleParents]
        );
        let duplicate = &report.issues[0];
        assert_eq!(duplicate.node, "c");
        assert_eq!(duplicate.positions, [2, 3]);
        assert!(duplicate.related.is_empty());
        let aliasing = &report.issues[1];
        assert_eq!(aliasing.node, "c");
        assert_eq!(aliasing.related, ["p", "q"]);
    }

    #[test]
    fn test_not_instantiable() {
        let chunk = chunk(vec![
            named("abstract", "files-Node"),
            SerializedNode::new("enum", ptr("files-Kind")),
            SerializedNode::new("iface", builtins::inamed()),
        ]);
        let report = check(&chunk);
        assert_eq!(kinds(&report)[..2], [IssueKind::NotInstantiable, IssueKind::NotInstantiable]);
        assert!(report.for_node("iface").any(|i| i.kind == IssueKind::NotInstantiable));
    }

    #[test]
    fn test_incompatible_children() {
        let chunk = chunk(vec![
            named("root", "files-Folder")
                .with_children(ptr("files-Folder-items"), ["drive"])
                .with_annotation("note"),
            SerializedNode::new("drive", ptr("files-Drive")).with_parent("root"),
            SerializedNode::new("note", ptr("files-Note")).with_parent("root"),
        ]);
        let report = check(&chunk);
        assert_eq!(
            kinds(&report),
            [IssueKind::IncompatibleChild, IssueKind::IncompatibleChild]
        );
    }

    #[test]
    fn test_warnings() {
        let mut chunk = chunk(vec![
            named("root", "files-Folder"),
            named("a", "files-File").with_parent("root"),
        ]);
        chunk.languages.clear();
        let report = check(&chunk);
        assert!(!report.has_errors());
        assert_eq!(
            kinds(&report),
            [
                IssueKind::UndeclaredLanguage,
                IssueKind::UndeclaredLanguage,
                IssueKind::ParentMismatch,
            ]
        );
    }
}
