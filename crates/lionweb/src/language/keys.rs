//! Pluggable key and id derivation.
//!
//! Keys identify schema elements and must be stable for the same
//! (language, qualified name) input. Ids identify nodes and only need to be
//! unique within a chunk.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Derives the key of a schema element from its naming context.
pub trait KeyGenerator {
    /// `qualified_name` is `Entity` for entities, `Entity.feature` for
    /// features and `Enumeration.literal` for literals.
    fn key(&self, language_key: &str, qualified_name: &str) -> String;
}

/// Produces node ids, optionally from seed data.
pub trait IdGenerator {
    fn next_id(&mut self, seed: Option<&str>) -> String;
}

/// `<language>-<Qualified-Name>` keys, e.g. `files-Folder-items`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedNameKeys;

impl KeyGenerator for QualifiedNameKeys {
    fn key(&self, language_key: &str, qualified_name: &str) -> String {
        format!("{}-{}", language_key, qualified_name.replace('.', "-"))
    }
}

/// Hex-encoded SHA-256 of `language:qualified_name`, truncated to 16 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedKeys;

impl KeyGenerator for HashedKeys {
    fn key(&self, language_key: &str, qualified_name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(language_key.as_bytes());
        hasher.update(b":");
        hasher.update(qualified_name.as_bytes());
        let hash = hasher.finalize();
        to_hex(&hash[..16])
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... Seeds are ignored.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, _seed: Option<&str>) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// UUID ids: time-ordered v7 without a seed, a SHA-256 derived v8 with one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, seed: Option<&str>) -> String {
        match seed {
            Some(seed) => derived_uuid(seed.as_bytes()).to_string(),
            None => Uuid::now_v7().to_string(),
        }
    }
}

/// Derives a UUIDv8 from input bytes using SHA-256.
///
/// ```text
/// hash = SHA-256(input_bytes)[0:16]
/// hash[6] = (hash[6] & 0x0F) | 0x80  // version 8
/// hash[8] = (hash[8] & 0x3F) | 0x80  // RFC 4122 variant
/// ```
pub fn derived_uuid(input: &[u8]) -> Uuid {
    let hash = Sha256::digest(input);
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    bytes[6] = (bytes[6] & 0x0F) | 0x80;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    Uuid::from_bytes(bytes)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        s.push_str(&format!("{:02x}", byte));
    }
    s
}
