//! Format versions and size limits for serialization chunks.

/// Serialization format version written by default.
pub const DEFAULT_FORMAT_VERSION: &str = "2023.1";

/// Serialization format versions accepted by the decoder.
pub const SUPPORTED_FORMAT_VERSIONS: &[&str] = &["2023.1", "2024.1"];

/// Maximum size of a decompressed chunk (256 MiB).
pub const MAX_CHUNK_SIZE: usize = 256 * 1024 * 1024;

/// Default zstd compression level for compressed chunks.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Returns true if the decoder understands the given format version.
pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_FORMAT_VERSIONS.contains(&version)
}
