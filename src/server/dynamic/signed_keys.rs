//! Rotating HMAC keys for signed cookies.
//!
//! The first key signs new values; every key in the set is accepted during
//! verification so keys can be rotated without invalidating issued cookies.

use arc_swap::ArcSwap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Current signing key set, replaced wholesale on refresh.
#[derive(Debug)]
pub struct SignedKeys {
    defaults: Arc<Vec<String>>,
    keys: ArcSwap<Vec<String>>,
}

impl SignedKeys {
    /// Creates a key set seeded with the startup keys.
    ///
    /// # Arguments
    /// - `defaults` - Keys from the environment, restored whenever no `signedKey` row is active
    pub fn new(defaults: Vec<String>) -> Self {
        let defaults = Arc::new(defaults);
        Self {
            keys: ArcSwap::new(defaults.clone()),
            defaults,
        }
    }

    /// Installs a comma-separated key list, newest key first.
    ///
    /// # Arguments
    /// - `raw` - Comma-separated keys; blank items are ignored
    ///
    /// # Returns
    /// - `true` - Keys installed
    /// - `false` - The list contained no usable key, previous keys kept
    pub fn set(&self, raw: &str) -> bool {
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();

        if keys.is_empty() {
            error!(category = "signedKey", "Signed key row contains no keys");
            return false;
        }

        self.keys.store(Arc::new(keys));
        true
    }

    /// Restores the startup keys.
    pub fn reset(&self) {
        self.keys.store(self.defaults.clone());
    }

    /// The key set currently in effect.
    pub fn keys(&self) -> Arc<Vec<String>> {
        self.keys.load_full()
    }

    /// Signs a value with the newest key.
    ///
    /// # Returns
    /// - `Some(String)` - Hex encoded HMAC-SHA256 signature
    /// - `None` - No key is configured
    pub fn sign(&self, value: &str) -> Option<String> {
        let keys = self.keys.load();
        let key = keys.first()?;

        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
        mac.update(value.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies a signature against every key of the current set.
    pub fn verify(&self, value: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };

        self.keys.load().iter().any(|key| {
            let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
                return false;
            };
            mac.update(value.as_bytes());
            mac.verify_slice(&provided).is_ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that a signature made with the newest key verifies.
    #[test]
    fn signs_and_verifies() {
        let keys = SignedKeys::new(vec!["secret".to_string()]);
        let signature = keys.sign("track-id").unwrap();

        assert!(keys.verify("track-id", &signature));
        assert!(!keys.verify("other-id", &signature));
        assert!(!keys.verify("track-id", "zz-not-hex"));
    }

    /// Tests key rotation.
    ///
    /// Signatures made with a key that moved to the second position still verify,
    /// signatures made with a dropped key do not.
    #[test]
    fn rotated_keys_still_verify() {
        let keys = SignedKeys::new(vec!["old".to_string()]);
        let old_signature = keys.sign("value").unwrap();

        assert!(keys.set("new, old"));
        assert!(keys.verify("value", &old_signature));
        assert_ne!(keys.sign("value").unwrap(), old_signature);

        assert!(keys.set("newer"));
        assert!(!keys.verify("value", &old_signature));
    }

    /// Tests that blank key lists are rejected and reset restores the defaults.
    #[test]
    fn blank_list_keeps_previous_keys() {
        let keys = SignedKeys::new(vec!["default".to_string()]);
        assert!(keys.set("a,b"));
        assert!(!keys.set(" , "));
        assert_eq!(keys.keys().as_slice(), ["a", "b"]);

        keys.reset();
        assert_eq!(keys.keys().as_slice(), ["default"]);
    }
}
