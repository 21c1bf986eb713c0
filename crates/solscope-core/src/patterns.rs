//! Behavioral pattern detection
//!
//! Classifies a wallet's activity list into pattern tags using fixed
//! thresholds and a coefficient-of-variation test on swap intervals.

use std::collections::HashMap;

use crate::models::*;

/// Below this many activities no classification is attempted
pub const MIN_ACTIVITIES_FOR_PATTERNS: usize = 5;

/// Minimum swaps needed before interval regularity is measured
pub const MIN_SWAPS_FOR_DCA: usize = 3;

/// Maximum coefficient of variation of swap gaps that still counts as DCA
pub const DCA_MAX_VARIATION: f64 = 0.3;

pub const MIN_STAKES_FOR_YIELD_FARMING: usize = 3;

pub const DCA_CONFIDENCE: f64 = 0.7;
pub const LENDING_CONFIDENCE: f64 = 0.9;
pub const YIELD_FARMING_CONFIDENCE: f64 = 0.8;
pub const GENERAL_CONFIDENCE: f64 = 0.5;

/// Classify activity history into zero or more patterns.
///
/// `insufficient_data` and `general` are only ever returned alone.
pub fn analyze_patterns(activities: &[WalletActivity]) -> Vec<TransactionPattern> {
    if activities.len() < MIN_ACTIVITIES_FOR_PATTERNS {
        return vec![TransactionPattern {
            pattern_type: PatternType::InsufficientData,
            confidence: 0.0,
            description: format!(
                "Not enough transaction history to identify patterns ({} of {} activities needed)",
                activities.len(),
                MIN_ACTIVITIES_FOR_PATTERNS
            ),
        }];
    }

    let groups = group_by_type(activities);

    let mut patterns = Vec::new();

    let swaps = group(&groups, ActivityType::Swap);
    if swaps.len() >= MIN_SWAPS_FOR_DCA && is_regular_interval(swaps) {
        patterns.push(TransactionPattern {
            pattern_type: PatternType::Dca,
            confidence: DCA_CONFIDENCE,
            description: format!(
                "Dollar-cost averaging: {} swaps at regular intervals",
                swaps.len()
            ),
        });
    }

    let lending = group(&groups, ActivityType::Lending);
    if !lending.is_empty() {
        patterns.push(TransactionPattern {
            pattern_type: PatternType::LendingActive,
            confidence: LENDING_CONFIDENCE,
            description: format!(
                "Active lending participant with {} lending transactions",
                lending.len()
            ),
        });
    }

    let staking = group(&groups, ActivityType::Staking);
    if staking.len() >= MIN_STAKES_FOR_YIELD_FARMING {
        patterns.push(TransactionPattern {
            pattern_type: PatternType::YieldFarming,
            confidence: YIELD_FARMING_CONFIDENCE,
            description: format!(
                "Yield farming behavior with {} staking transactions",
                staking.len()
            ),
        });
    }

    if patterns.is_empty() {
        patterns.push(TransactionPattern {
            pattern_type: PatternType::General,
            confidence: GENERAL_CONFIDENCE,
            description: "General trading activity with no dominant pattern".to_string(),
        });
    }

    patterns
}

fn group_by_type(activities: &[WalletActivity]) -> HashMap<ActivityType, Vec<&WalletActivity>> {
    let mut groups: HashMap<ActivityType, Vec<&WalletActivity>> = HashMap::new();
    for activity in activities {
        groups.entry(activity.activity_type).or_default().push(activity);
    }
    groups
}

fn group<'a>(
    groups: &'a HashMap<ActivityType, Vec<&'a WalletActivity>>,
    activity_type: ActivityType,
) -> &'a [&'a WalletActivity] {
    groups.get(&activity_type).map(Vec::as_slice).unwrap_or(&[])
}

/// True when the gaps between consecutive swaps vary by less than
/// [`DCA_MAX_VARIATION`] of their mean.
///
/// A zero mean gap (every swap in the same millisecond) is not a schedule
/// and never qualifies.
fn is_regular_interval(swaps: &[&WalletActivity]) -> bool {
    let mut timestamps: Vec<i64> = swaps.iter().map(|a| a.timestamp).collect();
    timestamps.sort_unstable_by(|a, b| b.cmp(a));

    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| (pair[0] - pair[1]) as f64)
        .collect();

    match coefficient_of_variation(&gaps) {
        Some(cv) => cv < DCA_MAX_VARIATION,
        None => false,
    }
}

/// Population standard deviation over mean. `None` when undefined.
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}
