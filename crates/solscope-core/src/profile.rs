//! Wallet profiling
//!
//! Summarizes an activity list into a [`WalletProfile`]: volume, activity
//! window, favorite protocols, diversification and an inferred risk profile.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::*;
use crate::protocols::{identify_protocol, UNKNOWN_PROTOCOL};

pub const MAX_FAVORITE_PROTOCOLS: usize = 5;

/// Diversification points per distinct known protocol, capped at 100
pub const DIVERSIFICATION_PER_PROTOCOL: usize = 20;

/// Share of swap/trading activity above which a wallet counts as aggressive
pub const AGGRESSIVE_TRADING_SHARE: f64 = 0.6;

/// Share of staking/lending activity from which a wallet counts as conservative
pub const CONSERVATIVE_YIELD_SHARE: f64 = 0.4;

pub fn build_wallet_profile(address: &str, activities: &[WalletActivity]) -> WalletProfile {
    let mut protocol_counts: HashMap<&'static str, usize> = HashMap::new();
    for activity in activities {
        let protocol = identify_protocol(activity.program_id.as_deref());
        if protocol != UNKNOWN_PROTOCOL {
            *protocol_counts.entry(protocol).or_default() += 1;
        }
    }

    let mut favorite_protocols: Vec<ProtocolUsage> = protocol_counts
        .iter()
        .map(|(name, count)| ProtocolUsage {
            name: name.to_string(),
            count: *count,
        })
        .collect();
    favorite_protocols.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    favorite_protocols.truncate(MAX_FAVORITE_PROTOCOLS);

    let portfolio_diversification =
        (protocol_counts.len() * DIVERSIFICATION_PER_PROTOCOL).min(100) as u8;

    let first_activity_date = activities
        .iter()
        .map(|a| a.timestamp)
        .min()
        .and_then(DateTime::<Utc>::from_timestamp_millis);
    let last_activity_date = activities
        .iter()
        .map(|a| a.timestamp)
        .max()
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    let transaction_volume: f64 = activities
        .iter()
        .filter(|a| a.success)
        .map(WalletActivity::value_or_zero)
        .sum();

    WalletProfile {
        address: address.to_string(),
        risk_profile: infer_risk_profile(activities),
        portfolio_diversification,
        activity_count: activities.len(),
        first_activity_date,
        last_activity_date,
        transaction_volume,
        favorite_protocols,
    }
}

/// Infer a risk tier from the mix of activity types
pub fn infer_risk_profile(activities: &[WalletActivity]) -> RiskProfile {
    if activities.is_empty() {
        return RiskProfile::Moderate;
    }

    let total = activities.len() as f64;
    let share = |types: &[ActivityType]| {
        activities
            .iter()
            .filter(|a| types.contains(&a.activity_type))
            .count() as f64
            / total
    };

    if share(&[ActivityType::Swap, ActivityType::Trading]) > AGGRESSIVE_TRADING_SHARE {
        RiskProfile::Aggressive
    } else if share(&[ActivityType::Staking, ActivityType::Lending]) >= CONSERVATIVE_YIELD_SHARE {
        RiskProfile::Conservative
    } else {
        RiskProfile::Moderate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::program_address;

    fn activity(activity_type: ActivityType, protocol: &str, timestamp: i64) -> WalletActivity {
        WalletActivity {
            signature: format!("sig-{}", timestamp),
            activity_type,
            program_id: program_address(protocol).map(String::from),
            token: Some("SOL".to_string()),
            value: Some(2.5),
            timestamp,
            success: true,
            description: None,
        }
    }

    #[test]
    fn test_empty_profile() {
        let profile = build_wallet_profile("wallet", &[]);
        assert_eq!(profile.activity_count, 0);
        assert_eq!(profile.risk_profile, RiskProfile::Moderate);
        assert_eq!(profile.portfolio_diversification, 0);
        assert!(profile.first_activity_date.is_none());
        assert!(profile.favorite_protocols.is_empty());
    }

    #[test]
    fn test_profile_summary() {
        let mut activities = vec![
            activity(ActivityType::Swap, "RAYDIUM_SWAP", 3_000),
            activity(ActivityType::Swap, "RAYDIUM_SWAP", 1_000),
            activity(ActivityType::Staking, "MARINADE_STAKING", 2_000),
            activity(ActivityType::Transfer, "NOT_KNOWN", 4_000),
        ];
        activities[3].success = false;

        let profile = build_wallet_profile("wallet", &activities);

        assert_eq!(profile.activity_count, 4);
        assert_eq!(profile.transaction_volume, 7.5);
        assert_eq!(profile.portfolio_diversification, 40);
        assert_eq!(profile.first_activity_date.unwrap().timestamp_millis(), 1_000);
        assert_eq!(profile.last_activity_date.unwrap().timestamp_millis(), 4_000);
        assert_eq!(
            profile.favorite_protocols,
            vec![
                ProtocolUsage { name: "RAYDIUM_SWAP".to_string(), count: 2 },
                ProtocolUsage { name: "MARINADE_STAKING".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_diversification_caps_at_100() {
        let activities: Vec<_> = ["RAYDIUM_SWAP", "ORCA_SWAP", "SOLEND", "FLUXBEAM", "MANGO_MARKETS", "KAMINO_LENDING"]
            .iter()
            .enumerate()
            .map(|(i, p)| activity(ActivityType::Other, p, i as i64))
            .collect();
        let profile = build_wallet_profile("wallet", &activities);
        assert_eq!(profile.portfolio_diversification, 100);
        assert_eq!(profile.favorite_protocols.len(), MAX_FAVORITE_PROTOCOLS);
    }

    #[test]
    fn test_infer_risk_profile() {
        let swaps: Vec<_> = (0..4).map(|i| activity(ActivityType::Swap, "RAYDIUM_SWAP", i)).collect();
        assert_eq!(infer_risk_profile(&swaps), RiskProfile::Aggressive);

        let yields = vec![
            activity(ActivityType::Staking, "MARINADE_STAKING", 0),
            activity(ActivityType::Lending, "SOLEND", 1),
            activity(ActivityType::Transfer, "SYSTEM_PROGRAM", 2),
        ];
        assert_eq!(infer_risk_profile(&yields), RiskProfile::Conservative);

        let mixed = vec![
            activity(ActivityType::Swap, "RAYDIUM_SWAP", 0),
            activity(ActivityType::Transfer, "SYSTEM_PROGRAM", 1),
            activity(ActivityType::Mint, "TOKEN_PROGRAM", 2),
        ];
        assert_eq!(infer_risk_profile(&mixed), RiskProfile::Moderate);
    }
}
