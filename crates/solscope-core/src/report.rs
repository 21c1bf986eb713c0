//! Markdown report rendering
//!
//! Pure formatting over already-computed analytics. Section headings, emoji
//! and tier thresholds are part of the tool output contract, since clients
//! may parse the markdown structurally.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::*;
use crate::protocols::{identify_protocol, UNKNOWN_PROTOCOL};

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Number of transactions listed in the activity history
pub const RECENT_TRANSACTIONS_SHOWN: usize = 10;

/// Number of log lines listed in the transaction detail report
pub const LOG_LINES_SHOWN: usize = 10;

// =============================================================================
// Presentational tiers
// =============================================================================

pub fn complexity_tier(program_count: usize) -> &'static str {
    match program_count {
        0 | 1 => "Simple",
        2 | 3 => "Moderate",
        _ => "Complex",
    }
}

/// Concentration risk from a 0-100 diversification score
pub fn concentration_risk(diversification: u8) -> &'static str {
    if diversification < 30 {
        "High"
    } else if diversification < 60 {
        "Medium"
    } else {
        "Low"
    }
}

/// Activity frequency tier from a transaction count
pub fn activity_level(activity_count: usize) -> &'static str {
    if activity_count > 100 {
        "High"
    } else if activity_count > 50 {
        "Medium"
    } else {
        "Low"
    }
}

/// Human "time ago" in seconds, minutes, hours or days
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    let (amount, unit) = if seconds < 60 {
        (seconds, "second")
    } else if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else {
        (seconds / 86_400, "day")
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}

pub fn format_sol(lamports: i128) -> String {
    let sol = lamports as f64 / LAMPORTS_PER_SOL;
    let text = format!("{:.9}", sol);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} SOL", text)
}

fn format_timestamp_ms(timestamp_ms: i64, now: DateTime<Utc>) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(time) => format!(
            "{} ({})",
            time.format("%Y-%m-%d %H:%M:%S UTC"),
            time_ago(time, now)
        ),
        None => "unknown".to_string(),
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "N/A".to_string(),
    }
}

fn risk_badge(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "🟢",
        RiskLevel::Medium => "🟡",
        RiskLevel::High => "🔴",
    }
}

// =============================================================================
// Activity history
// =============================================================================

pub fn format_activity_history(
    address: &str,
    activities: &[WalletActivity],
    now: DateTime<Utc>,
) -> String {
    let mut out = format!("# 📊 Wallet Activity: {}\n\n", address);

    if activities.is_empty() {
        out.push_str("## 📭 No Activity Found\n\n");
        out.push_str("No transactions were found for this wallet.\n");
        return out;
    }

    let succeeded = activities.iter().filter(|a| a.success).count();
    let first = activities.iter().map(|a| a.timestamp).min().unwrap_or_default();
    let last = activities.iter().map(|a| a.timestamp).max().unwrap_or_default();

    out.push_str("## 📋 Summary\n\n");
    out.push_str(&format!("- **Total Transactions:** {}\n", activities.len()));
    out.push_str(&format!(
        "- **Success Rate:** {:.1}%\n",
        succeeded as f64 / activities.len() as f64 * 100.0
    ));
    out.push_str(&format!(
        "- **Period:** {} → {}\n\n",
        format_date(DateTime::<Utc>::from_timestamp_millis(first)),
        format_date(DateTime::<Utc>::from_timestamp_millis(last))
    ));

    let mut by_type: BTreeMap<ActivityType, usize> = BTreeMap::new();
    for activity in activities {
        *by_type.entry(activity.activity_type).or_default() += 1;
    }

    out.push_str("## 📈 Activity Breakdown\n\n");
    for (activity_type, count) in &by_type {
        out.push_str(&format!(
            "- **{}:** {} ({:.1}%)\n",
            activity_type,
            count,
            *count as f64 / activities.len() as f64 * 100.0
        ));
    }
    out.push('\n');

    let mut by_protocol: BTreeMap<&str, usize> = BTreeMap::new();
    for activity in activities {
        let protocol = identify_protocol(activity.program_id.as_deref());
        if protocol != UNKNOWN_PROTOCOL {
            *by_protocol.entry(protocol).or_default() += 1;
        }
    }

    out.push_str("## 🏛️ Protocols Used\n\n");
    if by_protocol.is_empty() {
        out.push_str("No known protocols detected.\n\n");
    } else {
        let mut ranked: Vec<(&str, usize)> = by_protocol.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (protocol, count) in ranked {
            out.push_str(&format!("- **{}:** {} transactions\n", protocol, count));
        }
        out.push('\n');
    }

    let mut recent: Vec<&WalletActivity> = activities.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    out.push_str("## 📝 Recent Transactions\n\n");
    for (i, activity) in recent.iter().take(RECENT_TRANSACTIONS_SHOWN).enumerate() {
        let status = if activity.success { "✅" } else { "❌" };
        out.push_str(&format!("### {}. {} {}\n\n", i + 1, activity.activity_type, status));
        out.push_str(&format!("- **Signature:** `{}`\n", activity.signature));
        out.push_str(&format!(
            "- **Time:** {}\n",
            format_timestamp_ms(activity.timestamp, now)
        ));
        out.push_str(&format!(
            "- **Protocol:** {}\n",
            identify_protocol(activity.program_id.as_deref())
        ));
        if let Some(token) = &activity.token {
            out.push_str(&format!("- **Token:** {}\n", token));
        }
        if let Some(value) = activity.value {
            out.push_str(&format!("- **Amount:** {:.4}\n", value));
        }
        if let Some(description) = &activity.description {
            out.push_str(&format!("- **Description:** {}\n", description));
        }
        out.push('\n');
    }

    if recent.len() > RECENT_TRANSACTIONS_SHOWN {
        out.push_str(&format!(
            "_…and {} older transactions._\n",
            recent.len() - RECENT_TRANSACTIONS_SHOWN
        ));
    }

    out
}

// =============================================================================
// Wallet analysis
// =============================================================================

pub fn format_wallet_analysis(analysis: &WalletAnalysis, now: DateTime<Utc>) -> String {
    let profile = &analysis.profile;
    let mut out = format!("# 🔍 Wallet Analysis: {}\n\n", profile.address);

    out.push_str("## 👤 Wallet Profile\n\n");
    out.push_str(&format!("- **Risk Profile:** {}\n", profile.risk_profile));
    out.push_str(&format!(
        "- **Portfolio Diversification:** {}/100\n",
        profile.portfolio_diversification
    ));
    out.push_str(&format!("- **Total Transactions:** {}\n", profile.activity_count));
    out.push_str(&format!(
        "- **Transaction Volume:** {:.4}\n",
        profile.transaction_volume
    ));
    out.push_str(&format!(
        "- **First Activity:** {}\n",
        format_date(profile.first_activity_date)
    ));
    out.push_str(&format!(
        "- **Last Activity:** {}",
        format_date(profile.last_activity_date)
    ));
    if let Some(last) = profile.last_activity_date {
        out.push_str(&format!(" ({})", time_ago(last, now)));
    }
    out.push_str("\n\n");

    out.push_str("## ⭐ Favorite Protocols\n\n");
    if profile.favorite_protocols.is_empty() {
        out.push_str("No known protocols detected.\n\n");
    } else {
        for (i, usage) in profile.favorite_protocols.iter().enumerate() {
            out.push_str(&format!(
                "{}. **{}** - {} transactions\n",
                i + 1,
                usage.name,
                usage.count
            ));
        }
        out.push('\n');
    }

    out.push_str("## 🧠 Transaction Patterns\n\n");
    if analysis.patterns.is_empty() {
        out.push_str("No patterns detected.\n\n");
    } else {
        for pattern in &analysis.patterns {
            out.push_str(&format!(
                "- **{}** ({:.0}% confidence): {}\n",
                pattern.pattern_type,
                pattern.confidence * 100.0,
                pattern.description
            ));
        }
        out.push('\n');
    }

    out.push_str("## 💼 DeFi Positions\n\n");
    if analysis.positions.is_empty() {
        out.push_str("No DeFi positions found.\n\n");
    } else {
        for position in &analysis.positions {
            out.push_str(&format!(
                "### {} on {}\n\n",
                position.position_type, position.protocol
            ));
            if let Some(token) = &position.token_a {
                out.push_str(&format!("- **Token:** {}\n", token));
            }
            out.push_str(&format!("- **Value:** {}\n", format_value(position.value)));
            if let Some(apy) = position.apy {
                out.push_str(&format!("- **Estimated APY:** {:.2}%\n", apy));
            }
            out.push_str(&format!(
                "- **Last Updated:** {}\n\n",
                format_timestamp_ms(position.timestamp, now)
            ));
        }
    }

    out.push_str("## 💡 Recommended Strategies\n\n");
    if analysis.strategies.is_empty() {
        out.push_str("No new strategies to recommend for this risk profile.\n\n");
    } else {
        for (i, strategy) in analysis.strategies.iter().enumerate() {
            out.push_str(&format!(
                "### {}. {} {} ({} risk)\n\n",
                i + 1,
                risk_badge(strategy.risk_level),
                strategy.strategy,
                strategy.risk_level
            ));
            out.push_str(&format!("{}\n\n", strategy.description));
            out.push_str(&format!(
                "- **Potential Return:** {}\n\n",
                strategy.potential_return
            ));
        }
    }

    out.push_str("## ⚠️ Risk Assessment\n\n");
    out.push_str(&format!(
        "- **Concentration Risk:** {}\n",
        concentration_risk(profile.portfolio_diversification)
    ));
    out.push_str(&format!(
        "- **Activity Level:** {} frequency\n",
        activity_level(profile.activity_count)
    ));

    out
}

// =============================================================================
// Transaction details
// =============================================================================

pub fn format_transaction_details(details: &TransactionDetails, now: DateTime<Utc>) -> String {
    let mut out = String::from("# 🧾 Transaction Details\n\n");

    out.push_str(&format!("- **Signature:** `{}`\n", details.signature));
    if details.success {
        out.push_str("- **Status:** ✅ Success\n");
    } else {
        out.push_str("- **Status:** ❌ Failed\n");
        if let Some(error) = &details.error {
            out.push_str(&format!("- **Error:** {}\n", error));
        }
    }
    out.push_str(&format!("- **Slot:** {}\n", details.slot));
    match details.block_time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)) {
        Some(time) => out.push_str(&format!(
            "- **Time:** {} ({})\n",
            time.format("%Y-%m-%d %H:%M:%S UTC"),
            time_ago(time, now)
        )),
        None => out.push_str("- **Time:** unknown\n"),
    }
    out.push_str(&format!(
        "- **Fee:** {}\n",
        format_sol(details.fee_lamports as i128)
    ));
    out.push_str(&format!(
        "- **Complexity:** {} ({} programs)\n\n",
        complexity_tier(details.programs.len()),
        details.programs.len()
    ));

    out.push_str("## 🔧 Programs Invoked\n\n");
    if details.programs.is_empty() {
        out.push_str("No programs recorded.\n\n");
    } else {
        for program in &details.programs {
            out.push_str(&format!(
                "- `{}` ({})\n",
                program,
                identify_protocol(Some(program))
            ));
        }
        out.push('\n');
    }

    if !details.signers.is_empty() {
        out.push_str("## ✍️ Signers\n\n");
        for signer in &details.signers {
            out.push_str(&format!("- `{}`\n", signer));
        }
        out.push('\n');
    }

    out.push_str("## 💰 Balance Changes\n\n");
    let changed: Vec<&BalanceChange> = details
        .balance_changes
        .iter()
        .filter(|c| c.delta_lamports() != 0)
        .collect();
    if changed.is_empty() {
        out.push_str("No SOL balance changes.\n\n");
    } else {
        for change in changed {
            let delta = change.delta_lamports();
            let sign = if delta > 0 { "+" } else { "-" };
            out.push_str(&format!(
                "- `{}`: {}{}\n",
                change.account,
                sign,
                format_sol(delta.abs())
            ));
        }
        out.push('\n');
    }

    if !details.token_changes.is_empty() {
        out.push_str("## 🪙 Token Changes\n\n");
        for change in &details.token_changes {
            out.push_str(&format!(
                "- `{}` {}: {:+.6}\n",
                change.mint,
                change.owner.as_deref().unwrap_or("unknown owner"),
                change.delta
            ));
        }
        out.push('\n');
    }

    out.push_str("## 📜 Logs\n\n");
    if details.log_messages.is_empty() {
        out.push_str("No log messages.\n");
    } else {
        out.push_str("```\n");
        for line in details.log_messages.iter().take(LOG_LINES_SHOWN) {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("```\n");
        if details.log_messages.len() > LOG_LINES_SHOWN {
            out.push_str(&format!(
                "_…{} more log lines._\n",
                details.log_messages.len() - LOG_LINES_SHOWN
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_complexity_tiers() {
        assert_eq!(complexity_tier(1), "Simple");
        assert_eq!(complexity_tier(2), "Moderate");
        assert_eq!(complexity_tier(3), "Moderate");
        assert_eq!(complexity_tier(4), "Complex");
    }

    #[test]
    fn test_risk_and_activity_tiers() {
        assert_eq!(concentration_risk(29), "High");
        assert_eq!(concentration_risk(30), "Medium");
        assert_eq!(concentration_risk(59), "Medium");
        assert_eq!(concentration_risk(60), "Low");

        assert_eq!(activity_level(101), "High");
        assert_eq!(activity_level(100), "Medium");
        assert_eq!(activity_level(51), "Medium");
        assert_eq!(activity_level(50), "Low");
    }

    #[test]
    fn test_time_ago_buckets() {
        let n = now();
        assert_eq!(time_ago(n - Duration::seconds(30), n), "30 seconds ago");
        assert_eq!(time_ago(n - Duration::minutes(1), n), "1 minute ago");
        assert_eq!(time_ago(n - Duration::minutes(59), n), "59 minutes ago");
        assert_eq!(time_ago(n - Duration::hours(5), n), "5 hours ago");
        assert_eq!(time_ago(n - Duration::days(3), n), "3 days ago");
        assert_eq!(time_ago(n + Duration::seconds(10), n), "0 seconds ago");
    }

    #[test]
    fn test_format_sol() {
        assert_eq!(format_sol(5_000), "0.000005 SOL");
        assert_eq!(format_sol(1_500_000_000), "1.5 SOL");
        assert_eq!(format_sol(2_000_000_000), "2 SOL");
    }

    #[test]
    fn test_empty_activity_history() {
        let report = format_activity_history("wallet", &[], now());
        assert!(report.contains("No Activity Found"));
    }

    #[test]
    fn test_activity_history_sections() {
        let activities: Vec<WalletActivity> = (0..12)
            .map(|i| WalletActivity {
                signature: format!("sig{}", i),
                activity_type: if i % 2 == 0 { ActivityType::Swap } else { ActivityType::Transfer },
                program_id: Some("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8".to_string()),
                token: Some("SOL".to_string()),
                value: Some(1.0),
                timestamp: (now() - Duration::hours(i)).timestamp_millis(),
                success: i != 3,
                description: None,
            })
            .collect();

        let report = format_activity_history("wallet", &activities, now());

        assert!(report.contains("- **Total Transactions:** 12"));
        assert!(report.contains("- **Success Rate:** 91.7%"));
        assert!(report.contains("- **Swap:** 6 (50.0%)"));
        assert!(report.contains("- **RAYDIUM_SWAP:** 12 transactions"));
        assert!(report.contains("### 1. Swap ✅"));
        assert!(report.contains("`sig0`"));
        assert!(!report.contains("`sig11`"));
        assert!(report.contains("and 2 older transactions"));
    }

    #[test]
    fn test_wallet_analysis_renders_empty_sections() {
        let analysis = WalletAnalysis {
            profile: WalletProfile {
                address: "wallet".to_string(),
                risk_profile: RiskProfile::Moderate,
                portfolio_diversification: 20,
                activity_count: 0,
                first_activity_date: None,
                last_activity_date: None,
                transaction_volume: 0.0,
                favorite_protocols: vec![],
            },
            patterns: vec![],
            positions: vec![],
            strategies: vec![],
        };

        let report = format_wallet_analysis(&analysis, now());

        assert!(report.contains("No DeFi positions found."));
        assert!(report.contains("No patterns detected."));
        assert!(report.contains("- **Concentration Risk:** High"));
        assert!(report.contains("- **Activity Level:** Low frequency"));
    }

    #[test]
    fn test_wallet_analysis_renders_content() {
        let analysis = WalletAnalysis {
            profile: WalletProfile {
                address: "wallet".to_string(),
                risk_profile: RiskProfile::Conservative,
                portfolio_diversification: 80,
                activity_count: 120,
                first_activity_date: Some(now() - Duration::days(30)),
                last_activity_date: Some(now() - Duration::hours(2)),
                transaction_volume: 42.0,
                favorite_protocols: vec![ProtocolUsage { name: "SOLEND".to_string(), count: 7 }],
            },
            patterns: vec![TransactionPattern {
                pattern_type: PatternType::LendingActive,
                confidence: 0.9,
                description: "lends".to_string(),
            }],
            positions: vec![DeFiPosition {
                protocol: "SOLEND".to_string(),
                position_type: PositionType::Lending,
                token_a: Some("USDC".to_string()),
                value: Some(100.0),
                apy: Some(4.25),
                timestamp: (now() - Duration::hours(2)).timestamp_millis(),
            }],
            strategies: vec![crate::strategy::StrategyId::StakingSol.strategy().clone()],
        };

        let report = format_wallet_analysis(&analysis, now());

        assert!(report.contains("- **Risk Profile:** conservative"));
        assert!(report.contains("1. **SOLEND** - 7 transactions"));
        assert!(report.contains("- **lending_active** (90% confidence): lends"));
        assert!(report.contains("### Lending on SOLEND"));
        assert!(report.contains("- **Estimated APY:** 4.25%"));
        assert!(report.contains("🟢 Staking SOL (low risk)"));
        assert!(report.contains("- **Concentration Risk:** Low"));
        assert!(report.contains("- **Activity Level:** High frequency"));
    }

    #[test]
    fn test_transaction_details_report() {
        let details = TransactionDetails {
            signature: "sig".to_string(),
            slot: 250_000_000,
            block_time: Some((now() - Duration::minutes(5)).timestamp()),
            success: false,
            error: Some("InstructionError".to_string()),
            fee_lamports: 5_000,
            programs: vec![
                "ComputeBudget111111111111111111111111111111".to_string(),
                "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4".to_string(),
            ],
            signers: vec!["wallet".to_string()],
            balance_changes: vec![
                BalanceChange { account: "wallet".to_string(), pre_lamports: 2_000_000_000, post_lamports: 1_499_995_000 },
                BalanceChange { account: "other".to_string(), pre_lamports: 10, post_lamports: 10 },
            ],
            token_changes: vec![],
            log_messages: (0..12).map(|i| format!("log {}", i)).collect(),
        };

        let report = format_transaction_details(&details, now());

        assert!(report.contains("- **Status:** ❌ Failed"));
        assert!(report.contains("- **Error:** InstructionError"));
        assert!(report.contains("(5 minutes ago)"));
        assert!(report.contains("- **Fee:** 0.000005 SOL"));
        assert!(report.contains("- **Complexity:** Moderate (2 programs)"));
        assert!(report.contains("(JUPITER_AGGREGATOR)"));
        assert!(report.contains("- `wallet`: -0.500005 SOL"));
        assert!(!report.contains("`other`"));
        assert!(report.contains("log 9"));
        assert!(!report.contains("log 10\n"));
        assert!(report.contains("2 more log lines"));
    }
}
