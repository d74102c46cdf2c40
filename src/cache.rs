//! Caller-owned memoization of derived results, keyed by a content
//! fingerprint of the raw rows and the configuration.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::classify::classify_all;
use crate::config::EngineConfig;
use crate::dashboard::{build_dashboard, Dashboard};
use crate::models::RawRow;
use crate::normalize::normalize;

/// SHA-256 hex digest of a raw row set plus the configuration applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of<C: Serialize>(rows: &[RawRow], config: &C) -> serde_json::Result<Self> {
        let mut hasher = Sha256::new();
        serde_json::to_writer(&mut hasher, rows)?;
        hasher.update([0u8]);
        serde_json::to_writer(&mut hasher, config)?;
        Ok(Self(hex::encode(hasher.finalize())))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
}

/// Entries older than the TTL are never returned.
pub struct SnapshotCache<T> {
    store: HashMap<Fingerprint, CacheEntry<T>>,
    ttl: Duration,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: HashMap::new(),
            ttl,
        }
    }

    fn is_live(&self, entry: &CacheEntry<T>) -> bool {
        entry.inserted_at.elapsed() < self.ttl
    }

    pub fn get(&self, key: &Fingerprint) -> Option<&T> {
        self.store
            .get(key)
            .filter(|entry| self.is_live(entry))
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: Fingerprint, value: T) {
        self.store.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: Fingerprint,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        let live = self.store.get(&key).is_some_and(|entry| self.is_live(entry));
        if live {
            debug!(fingerprint = %key, "snapshot cache hit");
        } else {
            debug!(fingerprint = %key, "snapshot cache miss");
            let value = compute()?;
            self.insert(key.clone(), value);
        }
        Ok(&self.store[&key].value)
    }

    /// Drops expired entries and returns how many were removed.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.store.len();
        let ttl = self.ttl;
        self.store.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Normalizes, classifies and builds a dashboard for `rows`, reusing a live
/// cached result for identical rows and configuration.
pub fn cached_dashboard<'a>(
    cache: &'a mut SnapshotCache<Dashboard>,
    rows: &[RawRow],
    config: &EngineConfig,
) -> anyhow::Result<&'a Dashboard> {
    let key = Fingerprint::of(rows, config)?;
    cache.get_or_try_insert_with(key, || -> anyhow::Result<Dashboard> {
        let plan = config.resolve()?;
        let records = classify_all(normalize(rows)?);
        Ok(build_dashboard(&records, &plan)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows(leads: u64) -> Vec<RawRow> {
        let row: RawRow = serde_json::from_value(json!({
            "Fecha": "03/06/2024",
            "Estatus": "Completado",
            "Motivo_Rechazo": "N/A",
            "Canal": "Google",
            "Producto": "Seguro",
            "Leads_Obtenidos": leads,
            "CPA": 90,
            "ROI": 1.7,
            "CTR": 0.06
        }))
        .unwrap();
        vec![row]
    }

    #[test]
    fn fingerprint_tracks_rows_and_config() {
        let config = EngineConfig::default();
        let a = Fingerprint::of(&sample_rows(3), &config).unwrap();
        let b = Fingerprint::of(&sample_rows(3), &config).unwrap();
        let c = Fingerprint::of(&sample_rows(4), &config).unwrap();
        let d = Fingerprint::of(
            &sample_rows(3),
            &EngineConfig {
                window: 3,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.to_string().len(), 64);
    }

    #[test]
    fn live_entry_is_reused() {
        let mut cache = SnapshotCache::new(Duration::from_secs(60));
        let key = Fingerprint::of(&sample_rows(1), &()).unwrap();
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(key.clone(), || -> Result<u32, ()> {
                    calls += 1;
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_recomputed_and_evicted() {
        let mut cache = SnapshotCache::new(Duration::ZERO);
        let key = Fingerprint::of(&sample_rows(1), &()).unwrap();
        cache.insert(key.clone(), 1u32);
        assert_eq!(cache.get(&key), None);

        let value = cache
            .get_or_try_insert_with(key.clone(), || -> Result<u32, ()> { Ok(2) })
            .unwrap();
        assert_eq!(*value, 2);
        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_compute_leaves_cache_empty() {
        let mut cache: SnapshotCache<u32> = SnapshotCache::new(Duration::from_secs(60));
        let key = Fingerprint::of(&sample_rows(1), &()).unwrap();
        let result = cache.get_or_try_insert_with(key, || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_dashboard_builds_once_per_fingerprint() {
        let mut cache = SnapshotCache::new(Duration::from_secs(60));
        let rows = sample_rows(5);
        let config = EngineConfig::default();
        let total = cached_dashboard(&mut cache, &rows, &config)
            .unwrap()
            .summary
            .total_leads;
        assert_eq!(total, 5);
        cached_dashboard(&mut cache, &rows, &config).unwrap();
        assert_eq!(cache.len(), 1);
    }
}
