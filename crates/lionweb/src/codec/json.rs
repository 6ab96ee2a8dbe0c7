//! JSON wire form of chunks, optionally zstd-compressed.
//!
//! Unknown JSON fields are ignored on read. Compressed input is detected by
//! the zstd frame magic, so callers can hand either form to
//! [`decode_chunk`].

use std::io::Read;

use crate::chunk::SerializationChunk;
use crate::error::ChunkFormatError;
use crate::limits::{MAX_CHUNK_SIZE, is_supported_version};

/// Magic bytes at the start of every zstd frame.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a chunk from JSON bytes or a zstd-compressed JSON frame.
pub fn decode_chunk(input: &[u8]) -> Result<SerializationChunk, ChunkFormatError> {
    if input.starts_with(&ZSTD_MAGIC) {
        let decompressed = decompress(input)?;
        decode_json(&decompressed)
    } else {
        decode_json(input)
    }
}

/// Decodes a chunk from a JSON string.
pub fn decode_chunk_str(input: &str) -> Result<SerializationChunk, ChunkFormatError> {
    decode_json(input.as_bytes())
}

/// Decompresses a zstd frame, bounded by [`MAX_CHUNK_SIZE`].
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, ChunkFormatError> {
    let decoder = zstd::Decoder::new(input)
        .map_err(|e| ChunkFormatError::DecompressionFailed(e.to_string()))?;

    let mut decompressed = Vec::new();
    decoder
        .take(MAX_CHUNK_SIZE as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| ChunkFormatError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() > MAX_CHUNK_SIZE {
        return Err(ChunkFormatError::LengthExceedsLimit {
            field: "decompressed chunk",
            len: decompressed.len(),
            max: MAX_CHUNK_SIZE,
        });
    }
    Ok(decompressed)
}

fn decode_json(input: &[u8]) -> Result<SerializationChunk, ChunkFormatError> {
    if input.len() > MAX_CHUNK_SIZE {
        return Err(ChunkFormatError::LengthExceedsLimit {
            field: "chunk",
            len: input.len(),
            max: MAX_CHUNK_SIZE,
        });
    }

    let chunk: SerializationChunk = serde_json::from_slice(input)?;
    if !is_supported_version(&chunk.serialization_format_version) {
        return Err(ChunkFormatError::UnsupportedVersion {
            version: chunk.serialization_format_version,
        });
    }

    log::trace!(
        version = chunk.serialization_format_version.as_str(),
        nodes = chunk.nodes.len();
        "Decoded chunk JSON"
    );
    Ok(chunk)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a chunk as compact JSON.
pub fn encode_chunk(chunk: &SerializationChunk) -> Result<Vec<u8>, ChunkFormatError> {
    Ok(serde_json::to_vec(chunk)?)
}

/// Encodes a chunk as indented JSON.
pub fn encode_chunk_pretty(chunk: &SerializationChunk) -> Result<String, ChunkFormatError> {
    Ok(serde_json::to_string_pretty(chunk)?)
}

/// Encodes a chunk as compact JSON inside a zstd frame.
pub fn encode_chunk_compressed(
    chunk: &SerializationChunk,
    level: i32,
) -> Result<Vec<u8>, ChunkFormatError> {
    let json = encode_chunk(chunk)?;
    zstd::encode_all(json.as_slice(), level)
        .map_err(|e| ChunkFormatError::CompressionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ReferenceTarget, SerializedNode};
    use crate::language::{LanguageRef, MetaPointer};
    use crate::limits::DEFAULT_COMPRESSION_LEVEL;

    const SAMPLE: &str = r#"{
        "serializationFormatVersion": "2023.1",
        "languages": [{"key": "files", "version": "1"}],
        "nodes": [
            {
                "id": "n1",
                "classifier": {"language": "files", "version": "1", "key": "files-Folder"},
                "properties": [],
                "containments": [
                    {
                        "containment": {"language": "files", "version": "1", "key": "files-Folder-items"},
                        "children": ["n2"]
                    }
                ],
                "references": [],
                "annotations": [],
                "parent": null,
                "extraField": {"ignored": true}
            },
            {
                "id": "n2",
                "concept": {"language": "files", "version": "1", "key": "files-File"},
                "references": [
                    {
                        "reference": {"language": "files", "version": "1", "key": "files-File-link"},
                        "targets": [{"resolveInfo": "other", "reference": null}]
                    }
                ],
                "parent": "n1"
            }
        ]
    }"#;

    #[test]
    fn test_decode_tolerates_unknown_and_missing_fields() {
        let chunk = decode_chunk_str(SAMPLE).unwrap();
        assert_eq!(chunk.languages, vec![LanguageRef::new("files", "1")]);
        assert_eq!(chunk.nodes.len(), 2);

        let n2 = &chunk.nodes[1];
        assert_eq!(n2.classifier.key, "files-File");
        assert!(n2.properties.is_empty());
        assert_eq!(n2.parent.as_deref(), Some("n1"));
        assert_eq!(
            n2.references[0].targets[0],
            ReferenceTarget {
                resolve_info: Some("other".into()),
                reference: None
            }
        );
    }

    #[test]
    fn test_encode_uses_wire_field_names() {
        let chunk = SerializationChunk::new().with_node(
            SerializedNode::new("a", MetaPointer::new("l", "1", "C"))
                .with_targets(MetaPointer::new("l", "1", "r"), [ReferenceTarget::to("b")]),
        );
        let json = String::from_utf8(encode_chunk(&chunk).unwrap()).unwrap();
        assert!(json.starts_with(r#"{"serializationFormatVersion":"2023.1","languages":[]"#));
        assert!(json.contains(r#""classifier":{"language":"l","version":"1","key":"C"}"#));
        assert!(json.contains(r#""targets":[{"resolveInfo":null,"reference":"b"}]"#));
        assert!(json.contains(r#""parent":null"#));
        assert!(!json.contains("extraField"));
    }

    #[test]
    fn test_roundtrip_plain_and_compressed() {
        let chunk = decode_chunk_str(SAMPLE).unwrap();

        let plain = encode_chunk(&chunk).unwrap();
        assert_eq!(decode_chunk(&plain).unwrap(), chunk);

        let compressed = encode_chunk_compressed(&chunk, DEFAULT_COMPRESSION_LEVEL).unwrap();
        assert_eq!(&compressed[0..4], &ZSTD_MAGIC);
        assert_eq!(decode_chunk(&compressed).unwrap(), chunk);
    }

    #[test]
    fn test_unsupported_version() {
        let json = r#"{"serializationFormatVersion": "1999.1", "languages": [], "nodes": []}"#;
        assert!(matches!(
            decode_chunk_str(json),
            Err(ChunkFormatError::UnsupportedVersion { ref version }) if version == "1999.1"
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(decode_chunk(b"{\"nodes\": ["), Err(ChunkFormatError::Json(_))));
    }
}
