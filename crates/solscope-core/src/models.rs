//! Data models for wallet analytics
//!
//! These models describe what Solscope observes about a wallet (activities,
//! transaction details) and what it derives from those observations
//! (patterns, positions, profiles, strategies).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Observed Data
// =============================================================================

/// One observed on-chain action associated with a wallet.
///
/// Produced by the activity source and consumed read-only by every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletActivity {
    /// Transaction signature (base58)
    pub signature: String,

    /// Classified activity type
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Program invoked by the transaction, if known
    #[serde(default)]
    pub program_id: Option<String>,

    /// Token involved (mint address or "SOL")
    #[serde(default)]
    pub token: Option<String>,

    /// Amount moved, in token units
    #[serde(default)]
    pub value: Option<f64>,

    /// Block time in epoch milliseconds
    pub timestamp: i64,

    /// Whether the transaction succeeded
    pub success: bool,

    #[serde(default)]
    pub description: Option<String>,
}

impl WalletActivity {
    /// Value of the activity, treating an absent value as zero
    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}

/// Closed set of activity classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivityType {
    Transfer,
    Swap,
    Mint,
    Staking,
    Trading,
    Lending,
    #[serde(rename = "Account Creation")]
    AccountCreation,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::Transfer,
        ActivityType::Swap,
        ActivityType::Mint,
        ActivityType::Staking,
        ActivityType::Trading,
        ActivityType::Lending,
        ActivityType::AccountCreation,
        ActivityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Transfer => "Transfer",
            ActivityType::Swap => "Swap",
            ActivityType::Mint => "Mint",
            ActivityType::Staking => "Staking",
            ActivityType::Trading => "Trading",
            ActivityType::Lending => "Lending",
            ActivityType::AccountCreation => "Account Creation",
            ActivityType::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Parse(format!("unknown activity type '{}'", s)))
    }
}

/// Decoded view of a single transaction, used by the transaction detail report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub signature: String,
    pub slot: u64,
    /// Block time in epoch seconds, when the cluster reports one
    pub block_time: Option<i64>,
    pub success: bool,
    /// Raw error reported by the runtime for failed transactions
    pub error: Option<String>,
    pub fee_lamports: u64,
    /// Distinct program ids invoked, in first-seen order
    pub programs: Vec<String>,
    pub signers: Vec<String>,
    pub balance_changes: Vec<BalanceChange>,
    pub token_changes: Vec<TokenChange>,
    pub log_messages: Vec<String>,
}

/// SOL balance movement for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub account: String,
    pub pre_lamports: u64,
    pub post_lamports: u64,
}

impl BalanceChange {
    pub fn delta_lamports(&self) -> i128 {
        self.post_lamports as i128 - self.pre_lamports as i128
    }
}

/// Token balance movement for one owner and mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenChange {
    pub owner: Option<String>,
    pub mint: String,
    /// Change in UI units (post - pre)
    pub delta: f64,
}

// =============================================================================
// Derived Data
// =============================================================================

/// A labeled behavioral classification derived from activity history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPattern {
    pub pattern_type: PatternType,
    /// Fixed per pattern type, in [0, 1]
    pub confidence: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    InsufficientData,
    Dca,
    LendingActive,
    YieldFarming,
    General,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::InsufficientData => "insufficient_data",
            PatternType::Dca => "dca",
            PatternType::LendingActive => "lending_active",
            PatternType::YieldFarming => "yield_farming",
            PatternType::General => "general",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inferred, non-authoritative snapshot of a DeFi holding.
///
/// Positions are reconstructed from activity history, not read from
/// on-chain accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeFiPosition {
    /// Protocol name (e.g. "MARINADE_STAKING", "FLUXBEAM", "Aggregate")
    pub protocol: String,

    #[serde(rename = "type")]
    pub position_type: PositionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_a: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Estimated APY in percent. Sampled, not fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apy: Option<f64>,

    /// Epoch milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
    Staking,
    Trading,
    Lending,
    Liquidity,
    #[serde(rename = "Trading Statistics")]
    TradingStatistics,
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionType::Staking => write!(f, "Staking"),
            PositionType::Trading => write!(f, "Trading"),
            PositionType::Lending => write!(f, "Lending"),
            PositionType::Liquidity => write!(f, "Liquidity"),
            PositionType::TradingStatistics => write!(f, "Trading Statistics"),
        }
    }
}

/// A strategy suggestion drawn from the fixed catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub strategy: String,
    pub description: String,
    pub risk_level: RiskLevel,
    pub potential_return: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Tolerance tier governing strategy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskProfile {
    /// Parse a risk profile, mapping anything unrecognized to `Moderate`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskProfile::Conservative => write!(f, "conservative"),
            RiskProfile::Moderate => write!(f, "moderate"),
            RiskProfile::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl FromStr for RiskProfile {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "moderate" => Ok(RiskProfile::Moderate),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => Err(CoreError::Parse(format!("unknown risk profile '{}'", other))),
        }
    }
}

/// Aggregate summary of a wallet, built before strategy recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletProfile {
    pub address: String,
    pub risk_profile: RiskProfile,
    /// 0-100, higher = more protocols in use
    pub portfolio_diversification: u8,
    pub activity_count: usize,
    pub first_activity_date: Option<DateTime<Utc>>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub transaction_volume: f64,
    /// Most used protocols, most frequent first
    pub favorite_protocols: Vec<ProtocolUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolUsage {
    pub name: String,
    pub count: usize,
}

/// Everything the wallet analysis report renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub profile: WalletProfile,
    pub patterns: Vec<TransactionPattern>,
    pub positions: Vec<DeFiPosition>,
    pub strategies: Vec<Strategy>,
}
