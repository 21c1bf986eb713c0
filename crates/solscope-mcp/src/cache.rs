//! Process-wide wallet cache
//!
//! One entry per wallet address holding whatever has been computed for it so
//! far. Writes merge into the existing entry; entries expire after the
//! configured TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use solscope_core::{DeFiPosition, WalletActivity, WalletProfile};
use tokio::sync::Mutex;

use crate::config::CacheConfig;

/// Cached state for one wallet. `None` fields have not been computed yet.
#[derive(Debug, Clone, Default)]
pub struct WalletCacheEntry {
    pub activities: Option<Vec<WalletActivity>>,
    pub profile: Option<WalletProfile>,
    pub defi_positions: Option<Vec<DeFiPosition>>,
}

impl WalletCacheEntry {
    pub fn with_activities(activities: Vec<WalletActivity>) -> Self {
        Self {
            activities: Some(activities),
            ..Self::default()
        }
    }

    pub fn with_profile(profile: WalletProfile) -> Self {
        Self {
            profile: Some(profile),
            ..Self::default()
        }
    }

    pub fn with_defi_positions(positions: Vec<DeFiPosition>) -> Self {
        Self {
            defi_positions: Some(positions),
            ..Self::default()
        }
    }

    /// Overwrite the fields `update` carries, keep the rest.
    ///
    /// New activities drop the cached profile, which is derived from them.
    /// Positions are kept until the entry expires.
    pub fn merge(&mut self, update: WalletCacheEntry) {
        if update.activities.is_some() {
            self.activities = update.activities;
            self.profile = None;
        }
        if update.profile.is_some() {
            self.profile = update.profile;
        }
        if update.defi_positions.is_some() {
            self.defi_positions = update.defi_positions;
        }
    }
}

#[derive(Clone)]
pub struct WalletCache {
    entries: Cache<String, WalletCacheEntry>,
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl WalletCache {
    pub fn new(config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_seconds);

        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(ttl)
            .build();

        let locks = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(ttl)
            .build();

        Self { entries, locks }
    }

    pub async fn get(&self, address: &str) -> Option<WalletCacheEntry> {
        let entry = self.entries.get(address).await;
        tracing::debug!(wallet = %address, hit = entry.is_some(), "Wallet cache lookup");
        entry
    }

    /// Merge `update` into the wallet's entry, creating it if absent
    pub async fn update(&self, address: &str, update: WalletCacheEntry) {
        self.entries
            .entry(address.to_string())
            .and_upsert_with(|existing| {
                let mut entry = existing.map(|e| e.into_value()).unwrap_or_default();
                entry.merge(update);
                std::future::ready(entry)
            })
            .await;
    }

    /// Async lock serializing cache-filling work for one wallet
    pub async fn lock(&self, address: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(address.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}
