//! Simple inspector for LionWeb chunk files (plain JSON or zstd).
//!
//! Usage: `inspect_chunk <chunk> [other-chunk]`

use std::collections::BTreeMap;
use std::fs;

use lionweb::{decode_chunk, diff, validate, LanguageRegistry, SerializationChunk};

fn read(path: &str) -> SerializationChunk {
    println!("Reading: {}", path);
    let data = fs::read(path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());
    decode_chunk(&data).expect("Failed to decode")
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "chunk.json".to_string());
    let chunk = read(&path);

    println!("\n=== Chunk Info ===");
    println!("Format version: {}", chunk.serialization_format_version);
    println!("Languages: {}", chunk.languages.len());
    for language in &chunk.languages {
        println!("  - {}", language);
    }

    let mut per_classifier: BTreeMap<String, usize> = BTreeMap::new();
    for node in &chunk.nodes {
        *per_classifier.entry(node.classifier.to_string()).or_default() += 1;
    }
    println!("\n=== Nodes ({}) ===", chunk.nodes.len());
    for (classifier, count) in &per_classifier {
        println!("  {}: {}", classifier, count);
    }

    let roots = chunk.nodes.iter().filter(|n| n.parent.is_none()).count();
    println!("Roots: {}", roots);

    // Only the builtins are known here, so every user classifier is unknown.
    // Id, aliasing and parent checks still apply.
    let registry = LanguageRegistry::new(Vec::new()).expect("builtins are valid");
    let report = validate(&chunk, &registry);
    let structural: Vec<_> = report
        .issues
        .iter()
        .filter(|i| {
            !matches!(
                i.kind,
                lionweb::IssueKind::UnknownClassifier | lionweb::IssueKind::UndeclaredLanguage
            )
        })
        .collect();
    println!("\n=== Structural Issues ({}) ===", structural.len());
    for issue in structural.iter().take(20) {
        println!("  {}", issue);
    }
    if structural.len() > 20 {
        println!("  ... and {} more", structural.len() - 20);
    }

    if let Some(other) = args.next() {
        println!();
        let other = read(&other);
        let changes = diff(&chunk, &other);
        println!("\n=== Diff ({} changes) ===", changes.len());
        for change in changes.iter().take(50) {
            println!("  {}", change);
        }
        if changes.len() > 50 {
            println!("  ... and {} more", changes.len() - 50);
        }
    }
}
