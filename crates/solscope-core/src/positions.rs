//! DeFi position synthesis
//!
//! Reconstructs a best-effort list of positions from successful activities.
//! APY figures are sampled from protocol-specific ranges through an
//! [`ApySource`]; they are estimates, not market data, and two calls over the
//! same activities return different APYs.

use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::*;
use crate::protocols::identify_protocol;

pub const STAKING_APY: RangeInclusive<f64> = 5.0..=8.0;
pub const LENDING_APY: RangeInclusive<f64> = 3.0..=7.0;
pub const LIQUIDITY_APY: RangeInclusive<f64> = 8.0..=12.0;

/// Window for the recent-trading aggregate
pub const RECENT_TRADING_WINDOW_HOURS: i64 = 24;

pub const TRADING_PROTOCOL: &str = "FLUXBEAM";
pub const AGGREGATE_PROTOCOL: &str = "Aggregate";

const LIQUIDITY_PROTOCOLS: &[&str] = &["RAYDIUM_SWAP", "ORCA_SWAP"];

/// Source of APY estimates
pub trait ApySource {
    /// Return a value inside `range`
    fn sample_apy(&mut self, range: RangeInclusive<f64>) -> f64;
}

impl<R: Rng> ApySource for R {
    fn sample_apy(&mut self, range: RangeInclusive<f64>) -> f64 {
        let (low, high) = (*range.start(), *range.end());
        let sampled = (self.gen_range(range) * 100.0).round() / 100.0;
        sampled.clamp(low, high)
    }
}

/// Build positions from an activity list.
///
/// Only successful activities are considered. Staking, trading, lending and
/// liquidity passes are independent, so one activity may feed more than one
/// position.
pub fn synthesize_positions<A: ApySource + ?Sized>(
    activities: &[WalletActivity],
    now: DateTime<Utc>,
    apy: &mut A,
) -> Vec<DeFiPosition> {
    let successful: Vec<&WalletActivity> = activities.iter().filter(|a| a.success).collect();
    if successful.is_empty() {
        return Vec::new();
    }

    let now_ms = now.timestamp_millis();
    let mut positions = Vec::new();

    // Staking: one position per stake
    for activity in successful.iter().filter(|a| a.activity_type == ActivityType::Staking) {
        positions.push(yield_position(activity, PositionType::Staking, apy.sample_apy(STAKING_APY)));
    }

    // Trading: a single aggregate over the last 24 hours
    let window_start = now_ms - Duration::hours(RECENT_TRADING_WINDOW_HOURS).num_milliseconds();
    let recent_trades: Vec<&&WalletActivity> = successful
        .iter()
        .filter(|a| {
            a.activity_type == ActivityType::Swap
                || identify_protocol(a.program_id.as_deref()) == TRADING_PROTOCOL
        })
        .filter(|a| a.timestamp >= window_start)
        .collect();

    if let Some(latest) = recent_trades.iter().map(|a| a.timestamp).max() {
        positions.push(DeFiPosition {
            protocol: TRADING_PROTOCOL.to_string(),
            position_type: PositionType::Trading,
            token_a: None,
            value: Some(recent_trades.iter().map(|a| a.value_or_zero()).sum()),
            apy: None,
            timestamp: latest,
        });
    }

    // Lending: one position per lending action
    for activity in successful.iter().filter(|a| a.activity_type == ActivityType::Lending) {
        positions.push(yield_position(activity, PositionType::Lending, apy.sample_apy(LENDING_APY)));
    }

    // Liquidity: account creations on AMM pools
    for activity in successful.iter().filter(|a| {
        a.activity_type == ActivityType::AccountCreation
            && LIQUIDITY_PROTOCOLS.contains(&identify_protocol(a.program_id.as_deref()))
    }) {
        positions.push(yield_position(
            activity,
            PositionType::Liquidity,
            apy.sample_apy(LIQUIDITY_APY),
        ));
    }

    let swaps: Vec<&&WalletActivity> = successful
        .iter()
        .filter(|a| a.activity_type == ActivityType::Swap)
        .collect();
    if !swaps.is_empty() {
        positions.push(DeFiPosition {
            protocol: AGGREGATE_PROTOCOL.to_string(),
            position_type: PositionType::TradingStatistics,
            token_a: Some("Multiple".to_string()),
            value: Some(swaps.iter().map(|a| a.value_or_zero()).sum()),
            apy: None,
            timestamp: now_ms,
        });
    }

    positions
}

fn yield_position(activity: &WalletActivity, position_type: PositionType, apy: f64) -> DeFiPosition {
    DeFiPosition {
        protocol: identify_protocol(activity.program_id.as_deref()).to_string(),
        position_type,
        token_a: activity.token.clone(),
        value: activity.value,
        apy: Some(apy),
        timestamp: activity.timestamp,
    }
}
