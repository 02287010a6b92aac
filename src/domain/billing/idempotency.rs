//! Deterministic idempotency keys for processor calls.
//!
//! A key is derived from (scope, operation, target) so that a retried
//! request replays the same processor call instead of repeating its effect.

use sha2::{Digest, Sha256};
use std::fmt;

/// Keys are truncated to fit the processor's 45 character limit.
const KEY_LENGTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derives a key from the caller's scope, the operation and its target.
    pub fn derive(scope: &str, operation: &str, target: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [scope, operation, target] {
            // Length prefix keeps ("ab", "c") and ("a", "bc") distinct.
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        let mut hex = hex_encode(&hasher.finalize());
        hex.truncate(KEY_LENGTH);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex-encode bytes (lowercase).
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_give_same_key() {
        let a = IdempotencyKey::derive("user-1", "create_subscription", "WEEKLY:0");
        let b = IdempotencyKey::derive("user-1", "create_subscription", "WEEKLY:0");
        assert_eq!(a, b);
    }

    #[test]
    fn any_input_change_gives_new_key() {
        let base = IdempotencyKey::derive("user-1", "create_subscription", "WEEKLY:0");
        assert_ne!(base, IdempotencyKey::derive("user-2", "create_subscription", "WEEKLY:0"));
        assert_ne!(base, IdempotencyKey::derive("user-1", "create_customer", "WEEKLY:0"));
        assert_ne!(base, IdempotencyKey::derive("user-1", "create_subscription", "WEEKLY:1"));
    }

    #[test]
    fn parts_do_not_run_together() {
        assert_ne!(
            IdempotencyKey::derive("ab", "c", "d"),
            IdempotencyKey::derive("a", "bc", "d")
        );
    }

    #[test]
    fn key_is_lowercase_hex_of_fixed_length() {
        let key = IdempotencyKey::derive("u", "op", "t");
        assert_eq!(key.as_str().len(), 40);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hex_encode_pads_single_digits() {
        assert_eq!(hex_encode(&[0x00, 0x0f, 0xab]), "000fab");
    }
}
