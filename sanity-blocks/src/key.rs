//! Mark key generation strategies
//!
//! Migration lifts inline mark objects into `markDefs` entries, each of
//! which needs a `_key` that the owning span references. Production keys
//! must be globally unique across calls; tests need reproducible keys so
//! migrated output can be compared against golden values.

use serde_json::Value;
use uuid::Uuid;

/// Strategy for generating `_key` values during migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyGenerator {
    /// Globally unique random key (the production default)
    #[default]
    Random,

    /// Short stable hash of the mark type and its serialized value
    ///
    /// The same mark payload always yields the same key, so repeated
    /// occurrences of one inline mark collapse onto a single `markDefs`
    /// entry and migrated output is reproducible.
    Deterministic,
}

impl KeyGenerator {
    /// Generate a key for an inline mark of the given type and value
    pub fn generate(&self, mark_type: &str, value: &Value) -> String {
        match self {
            KeyGenerator::Random => Uuid::new_v4().simple().to_string(),
            KeyGenerator::Deterministic => {
                let payload = format!("{mark_type}:{value}");
                let digest = fnv1a(payload.as_bytes());
                let hex = format!("{digest:016x}");
                hex[..7].to_string()
            }
        }
    }
}

/// 64-bit FNV-1a over the raw bytes
///
/// Stable across platforms and releases, which `std`'s hasher does not
/// guarantee.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deterministic_keys_are_stable() {
        let value = json!({"href": "http://example.com/"});
        let first = KeyGenerator::Deterministic.generate("link", &value);
        let second = KeyGenerator::Deterministic.generate("link", &value);
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn deterministic_keys_differ_per_payload() {
        let link = KeyGenerator::Deterministic.generate("link", &json!({"href": "a"}));
        let other = KeyGenerator::Deterministic.generate("link", &json!({"href": "b"}));
        assert_ne!(link, other);

        let author = KeyGenerator::Deterministic.generate("author", &json!({"href": "a"}));
        assert_ne!(link, author, "type is part of the hashed payload");
    }

    #[test]
    fn random_keys_are_unique() {
        let value = json!({"href": "http://example.com/"});
        let first = KeyGenerator::Random.generate("link", &value);
        let second = KeyGenerator::Random.generate("link", &value);
        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
    }
}
