//! End-to-end behavior on small, hand-written chunks.

use lionweb::language::{builtins, Language, LanguageBuilder, LanguageRegistry, Multiplicity};
use lionweb::limits::DEFAULT_COMPRESSION_LEVEL;
use lionweb::{
    decode_chunk, decode_chunk_str, deserialize, diff, encode_chunk_compressed, serialize_graph,
    validate, Change, IssueKind, MetaPointer, Severity,
};

const FOLDER_CHUNK: &str = r#"{
    "serializationFormatVersion": "2023.1",
    "languages": [{"key": "files", "version": "1"}],
    "nodes": [
        {
            "id": "n1",
            "concept": {"language": "files", "version": "1", "key": "files-Folder"},
            "properties": [],
            "containments": [
                {
                    "containment": {"language": "files", "version": "1", "key": "files-Folder-items"},
                    "children": ["n2"]
                }
            ],
            "references": [],
            "parent": null
        },
        {
            "id": "n2",
            "concept": {"language": "files", "version": "1", "key": "files-File"}
        }
    ]
}"#;

fn files() -> Language {
    LanguageBuilder::new("Files", "files", "1")
        .concept("Folder", |c| c.containment("items", "File", Multiplicity::ZeroOrMore))
        .concept("File", |c| {
            c.optional_property("size", builtins::integer())
                .reference("link", "File", Multiplicity::Optional)
        })
        .build()
        .unwrap()
}

/// Same language without `Folder.items`.
fn files_without_items() -> Language {
    LanguageBuilder::new("Files", "files", "1")
        .concept("Folder", |c| c)
        .concept("File", |c| c.optional_property("size", builtins::integer()))
        .build()
        .unwrap()
}

fn ptr(key: &str) -> MetaPointer {
    MetaPointer::new("files", "1", key)
}

#[test]
fn folder_owns_file() {
    let registry = LanguageRegistry::new([files()]).unwrap();
    let chunk = decode_chunk_str(FOLDER_CHUNK).unwrap();

    let resolved = deserialize(&chunk, &registry).unwrap();
    assert!(resolved.issues.is_empty(), "{:?}", resolved.issues);

    let graph = &resolved.graph;
    let roots = resolved.roots();
    assert_eq!(roots.len(), 1);
    let n1 = roots[0];
    assert_eq!(graph[n1].id(), "n1");

    let n2 = graph.get("n2").unwrap();
    assert_eq!(graph[n1].children(&ptr("files-Folder-items")), [Some(n2)]);
    assert_eq!(graph[n2].parent(), Some(n1));
}

#[test]
fn validation_against_schema_without_items() {
    let registry = LanguageRegistry::new([files_without_items()]).unwrap();
    let chunk = decode_chunk_str(FOLDER_CHUNK).unwrap();

    let report = validate(&chunk, &registry);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1, "{:?}", report.issues);
    assert_eq!(errors[0].node, "n1");
    assert_eq!(errors[0].kind, IssueKind::UnknownFeature);
    assert!(errors[0].to_string().starts_with("error[unknown-feature] n1:"));
}

#[test]
fn size_change_is_one_property_change() {
    let chunk = |size: &str| {
        decode_chunk_str(&format!(
            r#"{{
                "serializationFormatVersion": "2023.1",
                "languages": [{{"key": "files", "version": "1"}}],
                "nodes": [{{
                    "id": "n1",
                    "classifier": {{"language": "files", "version": "1", "key": "files-File"}},
                    "properties": [{{
                        "property": {{"language": "files", "version": "1", "key": "files-File-size"}},
                        "value": "{size}"
                    }}]
                }}]
            }}"#
        ))
        .unwrap()
    };

    let changes = diff(&chunk("3"), &chunk("4"));
    assert_eq!(
        changes,
        [Change::PropertyChanged {
            id: "n1".into(),
            property: ptr("files-File-size"),
            before: Some("3".into()),
            after: Some("4".into()),
        }]
    );
}

#[test]
fn missing_child_becomes_placeholder() {
    let registry = LanguageRegistry::new([files()]).unwrap();
    let chunk = decode_chunk_str(
        r#"{
            "serializationFormatVersion": "2023.1",
            "languages": [{"key": "files", "version": "1"}],
            "nodes": [
                {
                    "id": "root",
                    "classifier": {"language": "files", "version": "1", "key": "files-Folder"},
                    "containments": [{
                        "containment": {"language": "files", "version": "1", "key": "files-Folder-items"},
                        "children": ["first", "missing", "last"]
                    }]
                },
                {"id": "last", "classifier": {"language": "files", "version": "1", "key": "files-File"}, "parent": "root"},
                {"id": "first", "classifier": {"language": "files", "version": "1", "key": "files-File"}, "parent": "root"}
            ]
        }"#,
    )
    .unwrap();

    let resolved = deserialize(&chunk, &registry).unwrap();
    assert_eq!(resolved.issues.len(), 1);
    let issue = &resolved.issues[0];
    assert_eq!(issue.kind, IssueKind::UnresolvedChild);
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.node, "root");
    assert_eq!(issue.related, ["missing"]);

    let graph = &resolved.graph;
    let root = graph.get("root").unwrap();
    assert_eq!(
        graph[root].children(&ptr("files-Folder-items")),
        [graph.get("first"), None, graph.get("last")]
    );
}

#[test]
fn resolved_graph_survives_reencoding() {
    let registry = LanguageRegistry::new([files()]).unwrap();
    let chunk = decode_chunk_str(FOLDER_CHUNK).unwrap();
    let resolved = deserialize(&chunk, &registry).unwrap();

    let written = serialize_graph(&resolved.graph, &registry).unwrap();
    let bytes = encode_chunk_compressed(&written, DEFAULT_COMPRESSION_LEVEL).unwrap();
    let read = decode_chunk(&bytes).unwrap();

    assert_eq!(read, written);
    assert!(diff(&chunk, &read).is_empty());
    assert_eq!(read.node("n2").unwrap().parent.as_deref(), Some("n1"));

    let again = deserialize(&read, &registry).unwrap();
    assert!(again.graph.structurally_eq(&resolved.graph));
}

#[test]
fn subtree_chunk_top_node_is_root() {
    let registry = LanguageRegistry::new([files()]).unwrap();
    let chunk = decode_chunk_str(
        r#"{
            "serializationFormatVersion": "2023.1",
            "languages": [{"key": "files", "version": "1"}],
            "nodes": [
                {
                    "id": "n1",
                    "classifier": {"language": "files", "version": "1", "key": "files-Folder"},
                    "containments": [{
                        "containment": {"language": "files", "version": "1", "key": "files-Folder-items"},
                        "children": ["n2"]
                    }],
                    "parent": "outside"
                },
                {"id": "n2", "classifier": {"language": "files", "version": "1", "key": "files-File"}, "parent": "n1"}
            ]
        }"#,
    )
    .unwrap();

    let resolved = deserialize(&chunk, &registry).unwrap();
    let graph = &resolved.graph;
    let n1 = graph.get("n1").unwrap();
    assert_eq!(resolved.roots(), [n1]);
    assert_eq!(graph[n1].declared_parent(), Some("outside"));

    assert_eq!(resolved.issues.len(), 1);
    assert_eq!(resolved.issues[0].kind, IssueKind::UnresolvedParent);
    assert!(!resolved.has_errors());

    let written = serialize_graph(graph, &registry).unwrap();
    assert_eq!(written.nodes.len(), 2);
    assert_eq!(written.node("n1").unwrap().parent.as_deref(), Some("outside"));

    let again = deserialize(&written, &registry).unwrap();
    assert!(again.graph.structurally_eq(graph));
}
