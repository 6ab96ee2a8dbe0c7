//! Non-fatal diagnostics produced by resolution and validation.

use std::fmt;

/// How serious an [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The input does not conform; callers should not trust the affected node.
    Error,
    /// Advisory; the input is still usable as-is.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// What an [`Issue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    DuplicateId,
    UnknownClassifier,
    NotInstantiable,
    UnknownFeature,
    FeatureKindMismatch,
    ArityViolation,
    MissingRequiredFeature,
    MalformedValue,
    MultipleParents,
    ParentMismatch,
    UnresolvedChild,
    UnresolvedReference,
    UnresolvedAnnotation,
    UnresolvedParent,
    IncompatibleChild,
    UndeclaredLanguage,
    SkippedNode,
}

impl IssueKind {
    /// Stable kebab-case code used in rendered diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::DuplicateId => "duplicate-id",
            IssueKind::UnknownClassifier => "unknown-classifier",
            IssueKind::NotInstantiable => "not-instantiable",
            IssueKind::UnknownFeature => "unknown-feature",
            IssueKind::FeatureKindMismatch => "feature-kind-mismatch",
            IssueKind::ArityViolation => "arity-violation",
            IssueKind::MissingRequiredFeature => "missing-required-feature",
            IssueKind::MalformedValue => "malformed-value",
            IssueKind::MultipleParents => "multiple-parents",
            IssueKind::ParentMismatch => "parent-mismatch",
            IssueKind::UnresolvedChild => "unresolved-child",
            IssueKind::UnresolvedReference => "unresolved-reference",
            IssueKind::UnresolvedAnnotation => "unresolved-annotation",
            IssueKind::UnresolvedParent => "unresolved-parent",
            IssueKind::IncompatibleChild => "incompatible-child",
            IssueKind::UndeclaredLanguage => "undeclared-language",
            IssueKind::SkippedNode => "skipped-node",
        }
    }
}

/// A diagnostic attached to one node of a chunk or graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Id of the offending node.
    pub node: String,
    /// Other nodes involved (the other parent, the missing target, ...).
    pub related: Vec<String>,
    /// Chunk positions involved, for issues about repeated ids.
    pub positions: Vec<usize>,
    pub message: String,
}

impl Issue {
    /// Creates an error-severity issue.
    pub fn error(kind: IssueKind, node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, node, message)
    }

    /// Creates a warning-severity issue.
    pub fn warning(kind: IssueKind, node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, node, message)
    }

    pub fn new(
        severity: Severity,
        kind: IssueKind,
        node: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            node: node.into(),
            related: Vec::new(),
            positions: Vec::new(),
            message: message.into(),
        }
    }

    /// Adds a secondary node id.
    pub fn with_related(mut self, id: impl Into<String>) -> Self {
        self.related.push(id.into());
        self
    }

    /// Adds a position in the chunk's node list.
    pub fn with_position(mut self, position: usize) -> Self {
        self.positions.push(position);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity,
            self.kind.code(),
            self.node,
            self.message
        )?;
        if !self.related.is_empty() {
            write!(f, " (see {})", self.related.join(", "))?;
        }
        if !self.positions.is_empty() {
            let positions: Vec<String> = self.positions.iter().map(usize::to_string).collect();
            write!(f, " [positions {}]", positions.join(", "))?;
        }
        Ok(())
    }
}

/// Returns true if any issue has error severity.
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(Issue::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_node_and_related() {
        let issue = Issue::error(IssueKind::MultipleParents, "c", "claimed twice")
            .with_related("p")
            .with_related("q");
        assert_eq!(
            issue.to_string(),
            "error[multiple-parents] c: claimed twice (see p, q)"
        );
    }

    #[test]
    fn test_display_includes_positions() {
        let issue = Issue::error(IssueKind::DuplicateId, "n1", "id occurs twice")
            .with_position(0)
            .with_position(3);
        assert!(issue.related.is_empty());
        assert_eq!(
            issue.to_string(),
            "error[duplicate-id] n1: id occurs twice [positions 0, 3]"
        );
    }

    #[test]
    fn test_has_errors() {
        let warning = Issue::warning(IssueKind::ParentMismatch, "a", "w");
        assert!(!has_errors(&[warning.clone()]));

        let error = Issue::error(IssueKind::UnknownFeature, "b", "e");
        assert!(has_errors(&[warning, error]));
        assert!(!has_errors(&[]));
    }
}
