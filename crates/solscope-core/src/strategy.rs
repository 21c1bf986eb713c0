//! Strategy recommendation
//!
//! Picks strategies from a fixed catalog by risk profile and drops the ones
//! the wallet is already pursuing through a known protocol.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::models::*;
use crate::protocols::{identify_protocol, UNKNOWN_PROTOCOL};

/// Identity of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyId {
    StartDefi,
    StakingSol,
    LiquidStaking,
    SupplyStablecoins,
    DiversifiedLp,
    LeveragedFarming,
    PerpetualTrading,
}

impl StrategyId {
    const ALL: [StrategyId; 7] = [
        StrategyId::StartDefi,
        StrategyId::StakingSol,
        StrategyId::LiquidStaking,
        StrategyId::SupplyStablecoins,
        StrategyId::DiversifiedLp,
        StrategyId::LeveragedFarming,
        StrategyId::PerpetualTrading,
    ];

    /// Catalog entry for this id
    pub fn strategy(&self) -> &'static Strategy {
        static CATALOG: OnceLock<HashMap<StrategyId, Strategy>> = OnceLock::new();
        let catalog = CATALOG.get_or_init(|| {
            StrategyId::ALL
                .into_iter()
                .map(|id| (id, id.build()))
                .collect()
        });
        &catalog[self]
    }

    fn build(&self) -> Strategy {
        let (name, description, risk_level, potential_return) = match self {
            StrategyId::StartDefi => (
                "Start DeFi",
                "Begin with native SOL staking to earn yield while getting familiar with Solana DeFi",
                RiskLevel::Low,
                "5-7% APY",
            ),
            StrategyId::StakingSol => (
                "Staking SOL",
                "Delegate SOL to a reliable validator for steady protocol rewards",
                RiskLevel::Low,
                "5-7% APY",
            ),
            StrategyId::LiquidStaking => (
                "Liquid Staking",
                "Stake SOL through Marinade and keep mSOL liquid for use across DeFi",
                RiskLevel::Low,
                "6-8% APY",
            ),
            StrategyId::SupplyStablecoins => (
                "Supply Stablecoins",
                "Lend USDC or USDT on Solend to earn interest with minimal price exposure",
                RiskLevel::Medium,
                "4-10% APY",
            ),
            StrategyId::DiversifiedLp => (
                "Diversified LP",
                "Split liquidity across several Raydium and Orca pools to earn trading fees",
                RiskLevel::Medium,
                "10-25% APY",
            ),
            StrategyId::LeveragedFarming => (
                "Leveraged Farming",
                "Borrow against collateral to amplify yield farming returns",
                RiskLevel::High,
                "25-60% APY",
            ),
            StrategyId::PerpetualTrading => (
                "Perpetual Trading",
                "Trade perpetual futures on Mango Markets with disciplined position sizing",
                RiskLevel::High,
                "Variable, -100% to +200%",
            ),
        };

        Strategy {
            strategy: name.to_string(),
            description: description.to_string(),
            risk_level,
            potential_return: potential_return.to_string(),
        }
    }
}

/// Base strategies for each risk profile, in recommendation order
pub fn strategies_for_profile(profile: RiskProfile) -> &'static [StrategyId] {
    match profile {
        RiskProfile::Conservative => &[StrategyId::StakingSol, StrategyId::LiquidStaking],
        RiskProfile::Moderate => &[StrategyId::SupplyStablecoins, StrategyId::DiversifiedLp],
        RiskProfile::Aggressive => &[StrategyId::LeveragedFarming, StrategyId::PerpetualTrading],
    }
}

/// Strategy a protocol already fulfils, if any
pub fn strategy_for_protocol(protocol: &str) -> Option<StrategyId> {
    match protocol {
        "MARINADE_STAKING" => Some(StrategyId::LiquidStaking),
        "SOLEND" => Some(StrategyId::SupplyStablecoins),
        "MANGO_MARKETS" => Some(StrategyId::PerpetualTrading),
        _ => None,
    }
}

/// Recommend strategies for a wallet.
///
/// A wallet with no activity always gets the beginner strategy. Otherwise the
/// profile's risk tier (moderate when no profile is given) selects a pair of
/// strategies, minus any the wallet already runs through a mapped protocol.
pub fn recommend_strategies(
    activities: &[WalletActivity],
    profile: Option<&WalletProfile>,
) -> Vec<Strategy> {
    if activities.is_empty() {
        return vec![StrategyId::StartDefi.strategy().clone()];
    }

    let risk_profile = profile.map(|p| p.risk_profile).unwrap_or_default();

    let used_protocols: HashSet<&'static str> = activities
        .iter()
        .filter(|a| matches!(a.program_id.as_deref(), Some(id) if id != UNKNOWN_PROTOCOL))
        .map(|a| identify_protocol(a.program_id.as_deref()))
        .collect();

    let covered: HashSet<StrategyId> = used_protocols
        .iter()
        .filter_map(|protocol| strategy_for_protocol(protocol))
        .collect();

    strategies_for_profile(risk_profile)
        .iter()
        .filter(|id| !covered.contains(*id))
        .map(|id| id.strategy().clone())
        .collect()
}
