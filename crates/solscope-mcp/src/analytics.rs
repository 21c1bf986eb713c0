//! Cache-aware wallet analytics
//!
//! Glues the RPC client, transaction parser and wallet cache to the pure
//! analytics in `solscope-core`.

use std::time::Instant;

use chrono::Utc;
use solscope_core::{
    analyze_patterns, build_wallet_profile, recommend_strategies, synthesize_positions,
    DeFiPosition, RiskProfile, TransactionDetails, WalletActivity, WalletAnalysis, WalletProfile,
};

use crate::cache::{WalletCache, WalletCacheEntry};
use crate::error::{McpError, Result};
use crate::parser;
use crate::rpc::SolanaRpc;

pub struct WalletService {
    rpc: SolanaRpc,
    cache: WalletCache,
    default_limit: usize,
}

impl WalletService {
    pub fn new(rpc: SolanaRpc, cache: WalletCache, default_limit: usize) -> Self {
        Self {
            rpc,
            cache,
            default_limit,
        }
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc.url()
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn cache(&self) -> &WalletCache {
        &self.cache
    }

    /// Fetch the latest `limit` activities from the cluster and cache them.
    ///
    /// Transactions are fetched one at a time. Signatures the cluster no
    /// longer serves are skipped.
    /// Replacing the cached activities drops the cached profile.
    pub async fn fetch_activity(&self, address: &str, limit: usize) -> Result<Vec<WalletActivity>> {
        let start = Instant::now();
        let signatures = self.rpc.get_signatures_for_address(address, limit).await?;

        let mut activities = Vec::with_capacity(signatures.len());
        for signature in &signatures {
            match self.rpc.get_transaction(&signature.signature).await? {
                Some(tx) => activities.push(parser::parse_activity(address, signature, &tx)),
                None => {
                    tracing::warn!(signature = %signature.signature, "Transaction not available, skipping");
                }
            }
        }

        self.cache
            .update(address, WalletCacheEntry::with_activities(activities.clone()))
            .await;

        tracing::info!(
            wallet = %address,
            count = activities.len(),
            duration_ms = %start.elapsed().as_millis(),
            "Fetched wallet activity"
        );

        Ok(activities)
    }

    /// Cached activities, fetching the default page on a miss
    pub async fn activities(&self, address: &str) -> Result<Vec<WalletActivity>> {
        if let Some(activities) = self.cache.get(address).await.and_then(|e| e.activities) {
            return Ok(activities);
        }
        self.fetch_activity(address, self.default_limit).await
    }

    /// Cached profile, built from `activities` on a miss
    pub async fn profile(&self, address: &str, activities: &[WalletActivity]) -> WalletProfile {
        if let Some(profile) = self.cache.get(address).await.and_then(|e| e.profile) {
            return profile;
        }

        let profile = build_wallet_profile(address, activities);
        self.cache
            .update(address, WalletCacheEntry::with_profile(profile.clone()))
            .await;
        profile
    }

    /// DeFi positions for a wallet.
    ///
    /// Cached positions are returned as-is until the entry expires. A wallet
    /// without any successful activity gets an empty list and nothing is
    /// cached. Callers for the same wallet queue on a per-wallet lock, so
    /// concurrent misses synthesize once.
    pub async fn defi_positions(&self, address: &str) -> Result<Vec<DeFiPosition>> {
        let lock = self.cache.lock(address).await;
        let _guard = lock.lock().await;

        if let Some(positions) = self.cache.get(address).await.and_then(|e| e.defi_positions) {
            tracing::debug!(wallet = %address, count = positions.len(), "Using cached positions");
            return Ok(positions);
        }

        let activities = self.activities(address).await?;
        if !activities.iter().any(|a| a.success) {
            return Ok(Vec::new());
        }

        let positions = synthesize_positions(&activities, Utc::now(), &mut rand::thread_rng());
        self.cache
            .update(address, WalletCacheEntry::with_defi_positions(positions.clone()))
            .await;

        tracing::info!(wallet = %address, count = positions.len(), "Synthesized DeFi positions");
        Ok(positions)
    }

    /// Full analysis: profile, patterns, positions and strategies.
    ///
    /// `risk_profile` overrides the inferred tier for this analysis only; the
    /// cached profile keeps the inferred one.
    pub async fn analyze_wallet(
        &self,
        address: &str,
        risk_profile: Option<RiskProfile>,
    ) -> Result<WalletAnalysis> {
        let activities = self.activities(address).await?;
        let mut profile = self.profile(address, &activities).await;
        if let Some(risk_profile) = risk_profile {
            profile.risk_profile = risk_profile;
        }
        let patterns = analyze_patterns(&activities);
        let positions = self.defi_positions(address).await?;
        let strategies = recommend_strategies(&activities, Some(&profile));

        Ok(WalletAnalysis {
            profile,
            patterns,
            positions,
            strategies,
        })
    }

    pub async fn transaction_details(&self, signature: &str) -> Result<TransactionDetails> {
        let tx = self
            .rpc
            .get_transaction(signature)
            .await?
            .ok_or_else(|| McpError::NotFound(format!("transaction {}", signature)))?;

        Ok(parser::transaction_details(signature, &tx))
    }
}
