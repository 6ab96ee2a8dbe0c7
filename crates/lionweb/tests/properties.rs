//! Round-trip, canonicalization, diff and resolution properties over random
//! containment forests.

use lionweb::language::{builtins, Language, LanguageBuilder, LanguageRegistry, Multiplicity};
use lionweb::{
    decode_chunk, deserialize, diff, encode_chunk, serialize_graph, Change, Graph, IssueKind,
    MetaPointer, PropertyValue, ReferenceTarget, ReferenceValue, SerializationChunk,
    SerializedNode,
};
use proptest::prelude::*;
use proptest::sample::Index;

fn tree() -> Language {
    LanguageBuilder::new("Tree", "tree", "1")
        .concept("Item", |c| {
            c.optional_property("name", builtins::string())
                .optional_property("size", builtins::integer())
                .containment("items", "Item", Multiplicity::ZeroOrMore)
                .reference("links", "Item", Multiplicity::ZeroOrMore)
        })
        .build()
        .unwrap()
}

fn ptr(key: &str) -> MetaPointer {
    MetaPointer::new("tree", "1", key)
}

/// A random forest: node `i` is either a root or a child of an earlier node.
#[derive(Debug, Clone)]
struct Shape {
    parents: Vec<Option<Index>>,
    sizes: Vec<Option<i64>>,
    links: Vec<Vec<Index>>,
}

fn shape() -> impl Strategy<Value = Shape> {
    (1usize..16).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::option::of(any::<Index>()), n),
            prop::collection::vec(prop::option::of(any::<i64>()), n),
            prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), n),
        )
            .prop_map(|(parents, sizes, links)| Shape {
                parents,
                sizes,
                links,
            })
    })
}

fn build(shape: &Shape) -> Graph {
    let n = shape.sizes.len();
    let mut graph = Graph::new();
    let handles: Vec<_> = (0..n)
        .map(|i| graph.add_node(format!("n{i}"), ptr("tree-Item")).unwrap())
        .collect();

    for i in 0..n {
        let node = handles[i];
        graph
            .set_property(
                node,
                ptr("tree-Item-name"),
                Some(PropertyValue::String(format!("node {i}"))),
            )
            .unwrap();
        if let Some(size) = shape.sizes[i] {
            graph
                .set_property(node, ptr("tree-Item-size"), Some(PropertyValue::Integer(size)))
                .unwrap();
        }
        if i > 0 {
            if let Some(parent) = &shape.parents[i] {
                graph
                    .add_child(handles[parent.index(i)], ptr("tree-Item-items"), node)
                    .unwrap();
            }
        }
        for link in &shape.links[i] {
            let target = format!("n{}", link.index(n));
            graph
                .add_reference(node, ptr("tree-Item-links"), ReferenceValue::to(target))
                .unwrap();
        }
    }
    graph
}

fn chunk_of(shape: &Shape, registry: &LanguageRegistry) -> SerializationChunk {
    serialize_graph(&build(shape), registry).unwrap()
}

fn sorted_debug(changes: impl IntoIterator<Item = Change>) -> Vec<String> {
    let mut lines: Vec<_> = changes.into_iter().map(|c| format!("{c:?}")).collect();
    lines.sort();
    lines
}

proptest! {
    #[test]
    fn graph_round_trips(shape in shape()) {
        let registry = LanguageRegistry::new([tree()]).unwrap();
        let graph = build(&shape);

        let chunk = serialize_graph(&graph, &registry).unwrap();
        prop_assert_eq!(chunk.nodes.len(), graph.len());

        let bytes = encode_chunk(&chunk).unwrap();
        let decoded = decode_chunk(&bytes).unwrap();
        let resolved = deserialize(&decoded, &registry).unwrap();

        prop_assert!(resolved.issues.is_empty(), "{:?}", resolved.issues);
        prop_assert!(resolved.graph.structurally_eq(&graph));
    }

    #[test]
    fn canonicalization_is_idempotent(shape in shape()) {
        let registry = LanguageRegistry::new([tree()]).unwrap();
        let once = chunk_of(&shape, &registry).into_canonical();
        let twice = once.clone().into_canonical();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn diff_with_itself_is_empty(shape in shape()) {
        let registry = LanguageRegistry::new([tree()]).unwrap();
        let chunk = chunk_of(&shape, &registry);
        prop_assert!(diff(&chunk, &chunk).is_empty());
        prop_assert!(diff(&chunk, &chunk.clone().into_canonical()).is_empty());
    }

    #[test]
    fn diff_is_symmetric(left in shape(), right in shape()) {
        let registry = LanguageRegistry::new([tree()]).unwrap();
        let a = chunk_of(&left, &registry);
        let b = chunk_of(&right, &registry);

        let forward = sorted_debug(diff(&a, &b));
        let backward = sorted_debug(diff(&b, &a).into_iter().map(Change::inverse));
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn adding_the_target_resolves_only_its_reference(shape in shape()) {
        let registry = LanguageRegistry::new([tree()]).unwrap();
        let mut chunk = chunk_of(&shape, &registry);
        chunk.nodes.push(
            SerializedNode::new("dangler", ptr("tree-Item")).with_targets(
                ptr("tree-Item-links"),
                [ReferenceTarget::to("late"), ReferenceTarget::to("never")],
            ),
        );

        let before = deserialize(&chunk, &registry).unwrap().issues;
        let unresolved = |issues: &[lionweb::Issue], id: &str| {
            issues
                .iter()
                .filter(|i| i.kind == IssueKind::UnresolvedReference && i.related == [id])
                .count()
        };
        prop_assert_eq!(unresolved(&before, "late"), 1);
        prop_assert_eq!(unresolved(&before, "never"), 1);

        chunk.nodes.push(SerializedNode::new("late", ptr("tree-Item")));
        let after = deserialize(&chunk, &registry).unwrap().issues;

        prop_assert_eq!(unresolved(&after, "late"), 0);
        let remaining: Vec<_> = before
            .into_iter()
            .filter(|i| !i.related.iter().any(|r| r == "late"))
            .collect();
        prop_assert_eq!(after, remaining);
    }
}
