//! Content fingerprints for "is this configuration already applied?" checks.

use std::collections::HashMap;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::bridge::HostBridge;
use crate::config::Configuration;

/// Result of fingerprinting a configuration.
///
/// `Unknown` means the host could not be asked. It never matches anything,
/// including another `Unknown`, so a failed hash can't mark a template in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Known(String),
    Unknown,
}

impl Fingerprint {
    pub fn matches(&self, other: &Fingerprint) -> bool {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Identity a cached fingerprint is stored under. Gallery and user entries
/// live in separate variants so a template name never collides with an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FingerprintKey {
    Baseline,
    Gallery(String),
    User(String),
}

/// Ask the host for a fingerprint. Failures and empty answers become `Unknown`.
pub async fn fingerprint(bridge: &dyn HostBridge, config: &Configuration) -> Fingerprint {
    match bridge.compute_fingerprint(config).await {
        Ok(hash) if !hash.is_empty() => Fingerprint::Known(hash),
        Ok(_) => {
            tracing::warn!("Host returned an empty fingerprint");
            Fingerprint::Unknown
        }
        Err(e) => {
            tracing::warn!("Failed to compute fingerprint: {}", e);
            Fingerprint::Unknown
        }
    }
}

/// Fingerprints keyed by identity, each remembered together with the value it
/// was computed from. A lookup whose value differs from the stored one is a miss.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: Mutex<HashMap<FingerprintKey, (Configuration, String)>>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, key: &FingerprintKey, config: &Configuration) -> Option<Fingerprint> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|(snapshot, _)| snapshot == config)
            .map(|(_, hash)| Fingerprint::Known(hash.clone()))
    }

    pub async fn get_or_compute(
        &self,
        bridge: &dyn HostBridge,
        key: FingerprintKey,
        config: &Configuration,
    ) -> Fingerprint {
        if let Some(hit) = self.cached(&key, config) {
            return hit;
        }

        let computed = fingerprint(bridge, config).await;
        // Unknown results are not stored so the next lookup asks again.
        if let Fingerprint::Known(ref hash) = computed {
            self.entries
                .lock()
                .insert(key, (config.clone(), hash.clone()));
        }
        computed
    }

    pub fn invalidate(&self, key: &FingerprintKey) {
        self.entries.lock().remove(key);
    }

    /// Drop every entry whose key no longer names a live item.
    pub fn retain(&self, mut keep: impl FnMut(&FingerprintKey) -> bool) {
        self.entries.lock().retain(|key, _| keep(key));
    }
}

/// SHA-256 over the JSON form of a configuration, hex encoded.
///
/// Struct fields serialize in declaration order, so equal values always hash
/// identically regardless of how they were built.
pub fn sha256_hex(config: &Configuration) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(config)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{add_button, remove_button, set_field, ConfigField};
    use crate::test_support::MockHost;

    fn sample() -> Configuration {
        Configuration {
            client_id: "abc".to_string(),
            details: "Coding".to_string(),
            ..Configuration::default()
        }
    }

    #[test]
    fn sha256_is_deterministic() {
        let a = sample();
        assert_eq!(sha256_hex(&a).unwrap(), sha256_hex(&a.clone()).unwrap());
    }

    #[test]
    fn sha256_distinguishes_structurally_different_configs() {
        let variants = [
            Configuration::default(),
            sample(),
            set_field(sample(), ConfigField::State, "In editor"),
            set_field(sample(), ConfigField::PartySize, "2"),
            add_button(sample()),
            crate::config::set_show_timestamps(sample(), true),
        ];
        for (i, a) in variants.iter().enumerate() {
            for b in variants.iter().skip(i + 1) {
                assert_ne!(sha256_hex(a).unwrap(), sha256_hex(b).unwrap());
            }
        }
    }

    #[test]
    fn removed_buttons_hash_like_a_fresh_config() {
        let c = remove_button(add_button(Configuration::default()), 0);
        assert_eq!(
            sha256_hex(&c).unwrap(),
            sha256_hex(&Configuration::default()).unwrap()
        );
    }

    #[test]
    fn unknown_never_matches() {
        let known = Fingerprint::Known("a".to_string());
        assert!(known.matches(&Fingerprint::Known("a".to_string())));
        assert!(!known.matches(&Fingerprint::Known("b".to_string())));
        assert!(!known.matches(&Fingerprint::Unknown));
        assert!(!Fingerprint::Unknown.matches(&Fingerprint::Unknown));
    }

    #[tokio::test]
    async fn bridge_failure_yields_unknown() {
        let host = MockHost::new(Configuration::default());
        host.fail_fingerprints(true);
        assert_eq!(fingerprint(&host, &sample()).await, Fingerprint::Unknown);
    }

    #[tokio::test]
    async fn cache_recomputes_when_value_changes() {
        let host = MockHost::new(Configuration::default());
        let cache = FingerprintCache::new();
        let key = FingerprintKey::User("1".to_string());

        let first = cache.get_or_compute(&host, key.clone(), &sample()).await;
        let again = cache.get_or_compute(&host, key.clone(), &sample()).await;
        assert_eq!(first, again);
        assert_eq!(host.fingerprint_calls(), 1);

        let changed = set_field(sample(), ConfigField::Details, "Gaming");
        let recomputed = cache.get_or_compute(&host, key, &changed).await;
        assert_ne!(first, recomputed);
        assert_eq!(host.fingerprint_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_results_are_not_cached() {
        let host = MockHost::new(Configuration::default());
        let cache = FingerprintCache::new();
        let key = FingerprintKey::Baseline;

        host.fail_fingerprints(true);
        let miss = cache.get_or_compute(&host, key.clone(), &sample()).await;
        assert_eq!(miss, Fingerprint::Unknown);

        host.fail_fingerprints(false);
        let hit = cache.get_or_compute(&host, key, &sample()).await;
        assert!(hit.is_known());
    }
}
