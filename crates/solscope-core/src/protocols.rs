//! Protocol identification
//!
//! Maps on-chain program addresses to canonical protocol names. The table is
//! static and the lookup index is built once on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Name returned for any program address not in the known table
pub const UNKNOWN_PROTOCOL: &str = "Unknown";

/// Known programs as `(name, address)` pairs
pub const KNOWN_PROGRAMS: &[(&str, &str)] = &[
    // Core runtime programs
    ("SYSTEM_PROGRAM", "11111111111111111111111111111111"),
    ("TOKEN_PROGRAM", "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"),
    ("TOKEN_2022_PROGRAM", "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb"),
    ("ASSOCIATED_TOKEN_PROGRAM", "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"),
    ("COMPUTE_BUDGET", "ComputeBudget111111111111111111111111111111"),
    ("MEMO_PROGRAM", "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr"),
    ("METAPLEX_METADATA", "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"),
    // Staking
    ("STAKE_PROGRAM", "Stake11111111111111111111111111111111111111"),
    ("MARINADE_STAKING", "MarBmsSgKXdrN1egZf5sqe1TMai9K1rChYNDJgjq7aD"),
    ("LIDO_STAKING", "CrX7kMhLC3cSsXJdT7JDgqrRVWGnUpX3gfEfxxU2NVLi"),
    ("SPL_STAKE_POOL", "SPoo1Ku8WFXoNDMHPsrGSTSG1Y47rzgn41SLUNakuHy"),
    // DEXs and aggregators
    ("JUPITER_AGGREGATOR", "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4"),
    ("RAYDIUM_SWAP", "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"),
    ("RAYDIUM_CLMM", "CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK"),
    ("ORCA_SWAP", "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP"),
    ("ORCA_WHIRLPOOL", "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc"),
    ("SERUM_DEX", "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"),
    ("FLUXBEAM", "FLUXubRmkEi2q6K3Y9kBPg9248ggaZVsoSFhtJHSrm1X"),
    ("METEORA_DLMM", "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo"),
    // Lending and perps
    ("SOLEND", "So1endDq2YkqhipRh3WViPa8hdiSpxWy6z3Z6tMCpAo"),
    ("KAMINO_LENDING", "KLend2g3cP87fffoy8q1mQqGKjrxjC8boSyAYavgmjD"),
    ("MANGO_MARKETS", "4MangoMjqJ2firMokCjjGgoK8d4MXcrgL7XJaL3w6fVg"),
];

const SWAP_PROTOCOLS: &[&str] = &[
    "JUPITER_AGGREGATOR",
    "RAYDIUM_SWAP",
    "RAYDIUM_CLMM",
    "ORCA_SWAP",
    "ORCA_WHIRLPOOL",
    "SERUM_DEX",
    "FLUXBEAM",
    "METEORA_DLMM",
];

const STAKING_PROTOCOLS: &[&str] = &[
    "STAKE_PROGRAM",
    "MARINADE_STAKING",
    "LIDO_STAKING",
    "SPL_STAKE_POOL",
];

const LENDING_PROTOCOLS: &[&str] = &["SOLEND", "KAMINO_LENDING"];

const CORE_PROTOCOLS: &[&str] = &[
    "SYSTEM_PROGRAM",
    "TOKEN_PROGRAM",
    "TOKEN_2022_PROGRAM",
    "ASSOCIATED_TOKEN_PROGRAM",
    "COMPUTE_BUDGET",
    "MEMO_PROGRAM",
];

fn address_index() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        KNOWN_PROGRAMS
            .iter()
            .map(|(name, address)| (*address, *name))
            .collect()
    })
}

/// Resolve a program address to its protocol name.
///
/// Matching is exact and case-sensitive. Absent or unlisted addresses yield
/// [`UNKNOWN_PROTOCOL`].
pub fn identify_protocol(program_id: Option<&str>) -> &'static str {
    program_id
        .and_then(|id| address_index().get(id).copied())
        .unwrap_or(UNKNOWN_PROTOCOL)
}

/// Address of a known protocol, by canonical name
pub fn program_address(name: &str) -> Option<&'static str> {
    KNOWN_PROGRAMS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, address)| *address)
}

pub fn known_programs() -> &'static [(&'static str, &'static str)] {
    KNOWN_PROGRAMS
}

pub fn is_swap_protocol(name: &str) -> bool {
    SWAP_PROTOCOLS.contains(&name)
}

pub fn is_staking_protocol(name: &str) -> bool {
    STAKING_PROTOCOLS.contains(&name)
}

pub fn is_lending_protocol(name: &str) -> bool {
    LENDING_PROTOCOLS.contains(&name)
}

pub fn is_perp_protocol(name: &str) -> bool {
    name == "MANGO_MARKETS"
}

/// Runtime plumbing that says nothing about what a transaction does
pub fn is_core_protocol(name: &str) -> bool {
    CORE_PROTOCOLS.contains(&name)
}
