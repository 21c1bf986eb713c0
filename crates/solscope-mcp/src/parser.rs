//! Transaction parsing
//!
//! Turns jsonParsed RPC transactions into [`WalletActivity`] records and
//! [`TransactionDetails`] views.

use std::collections::{BTreeMap, HashMap};

use solscope_core::{
    identify_protocol, is_core_protocol, is_lending_protocol, is_perp_protocol,
    is_staking_protocol, is_swap_protocol, ActivityType, BalanceChange, TokenChange,
    TransactionDetails, WalletActivity, LAMPORTS_PER_SOL, UNKNOWN_PROTOCOL,
};

use crate::rpc::{ParsedInstruction, RpcTransaction, SignatureInfo};

/// Token deltas smaller than this are rounding noise
const MIN_TOKEN_DELTA: f64 = 1e-9;

/// Lowercased log fragments emitted by AMM liquidity deposits
const LIQUIDITY_LOG_MARKERS: &[&str] = &[
    "addliquidity",
    "add_liquidity",
    "increaseliquidity",
    "openposition",
    "instruction: deposit",
];

const MINT_INSTRUCTIONS: &[&str] = &["mintTo", "mintToChecked"];

const ACCOUNT_CREATION_INSTRUCTIONS: &[&str] = &[
    "createAccount",
    "createAccountWithSeed",
    "create",
    "createIdempotent",
    "initializeAccount",
    "initializeAccount2",
    "initializeAccount3",
];

const TRANSFER_INSTRUCTIONS: &[&str] = &["transfer", "transferChecked", "transferWithSeed"];

/// Build the activity record a transaction represents for `address`
pub fn parse_activity(
    address: &str,
    signature: &SignatureInfo,
    tx: &RpcTransaction,
) -> WalletActivity {
    let (activity_type, program_id) = classify(tx);
    let (token, value) = wallet_movement(address, tx);

    let success = signature.err.is_none()
        && tx.meta.as_ref().map_or(true, |meta| meta.err.is_none());

    let timestamp = tx
        .block_time
        .or(signature.block_time)
        .map(|seconds| seconds * 1000)
        .unwrap_or_default();

    let protocol = identify_protocol(program_id);
    let mut description = if protocol == UNKNOWN_PROTOCOL {
        activity_type.to_string()
    } else {
        format!("{} via {}", activity_type, protocol)
    };
    if let Some(memo) = &signature.memo {
        description.push_str(&format!(" ({})", memo));
    }

    tracing::trace!(
        signature = %signature.signature,
        activity_type = %activity_type,
        protocol = %protocol,
        "Parsed activity"
    );

    WalletActivity {
        signature: signature.signature.clone(),
        activity_type,
        program_id: program_id.map(String::from),
        token,
        value,
        timestamp,
        success,
        description: Some(description),
    }
}

/// Decode the transaction detail view
pub fn transaction_details(signature: &str, tx: &RpcTransaction) -> TransactionDetails {
    let meta = tx.meta.clone().unwrap_or_default();
    let account_keys = &tx.transaction.message.account_keys;

    let balance_changes = account_keys
        .iter()
        .enumerate()
        .filter_map(|(i, key)| {
            Some(BalanceChange {
                account: key.pubkey.clone(),
                pre_lamports: *meta.pre_balances.get(i)?,
                post_lamports: *meta.post_balances.get(i)?,
            })
        })
        .collect();

    // account index -> (owner, mint, pre, post)
    let mut token_accounts: BTreeMap<usize, (Option<String>, String, f64, f64)> = BTreeMap::new();
    for balance in meta.pre_token_balances.iter().flatten() {
        let entry = token_accounts
            .entry(balance.account_index)
            .or_insert_with(|| (balance.owner.clone(), balance.mint.clone(), 0.0, 0.0));
        entry.2 = balance.ui_token_amount.value();
    }
    for balance in meta.post_token_balances.iter().flatten() {
        let entry = token_accounts
            .entry(balance.account_index)
            .or_insert_with(|| (balance.owner.clone(), balance.mint.clone(), 0.0, 0.0));
        entry.3 = balance.ui_token_amount.value();
    }

    let token_changes = token_accounts
        .into_values()
        .filter(|(_, _, pre, post)| (post - pre).abs() > MIN_TOKEN_DELTA)
        .map(|(owner, mint, pre, post)| TokenChange {
            owner,
            mint,
            delta: post - pre,
        })
        .collect();

    TransactionDetails {
        signature: signature.to_string(),
        slot: tx.slot,
        block_time: tx.block_time,
        success: meta.err.is_none(),
        error: meta.err.as_ref().map(|err| err.to_string()),
        fee_lamports: meta.fee,
        programs: invoked_programs(tx).into_iter().map(String::from).collect(),
        signers: account_keys
            .iter()
            .filter(|key| key.signer)
            .map(|key| key.pubkey.clone())
            .collect(),
        balance_changes,
        token_changes,
        log_messages: meta.log_messages.unwrap_or_default(),
    }
}

/// Top-level then inner instructions, in execution order per level
fn all_instructions(tx: &RpcTransaction) -> impl Iterator<Item = &ParsedInstruction> {
    let inner = tx
        .meta
        .as_ref()
        .and_then(|meta| meta.inner_instructions.as_ref())
        .into_iter()
        .flatten()
        .flat_map(|set| set.instructions.iter());

    tx.transaction.message.instructions.iter().chain(inner)
}

/// Distinct invoked program ids, first-seen order
fn invoked_programs(tx: &RpcTransaction) -> Vec<&str> {
    let mut programs: Vec<&str> = Vec::new();
    for instruction in all_instructions(tx) {
        if !programs.contains(&instruction.program_id.as_str()) {
            programs.push(&instruction.program_id);
        }
    }
    programs
}

/// Activity type and the program that determined it.
///
/// Protocol categories win over instruction types: lending, then perps,
/// staking, AMM liquidity deposits and swaps. Only transactions touching none
/// of those fall through to mint, account creation and transfer detection.
fn classify(tx: &RpcTransaction) -> (ActivityType, Option<&str>) {
    let programs = invoked_programs(tx);
    let named: Vec<(&str, &'static str)> = programs
        .iter()
        .map(|id| (*id, identify_protocol(Some(id))))
        .collect();
    let find = |matches: fn(&str) -> bool| {
        named
            .iter()
            .find(|(_, name)| matches(name))
            .map(|(id, _)| *id)
    };

    if let Some(id) = find(is_lending_protocol) {
        return (ActivityType::Lending, Some(id));
    }
    if let Some(id) = find(is_perp_protocol) {
        return (ActivityType::Trading, Some(id));
    }
    if let Some(id) = find(is_staking_protocol) {
        return (ActivityType::Staking, Some(id));
    }
    if let Some(id) = find(is_swap_protocol) {
        if adds_liquidity(tx) {
            return (ActivityType::AccountCreation, Some(id));
        }
        return (ActivityType::Swap, Some(id));
    }

    let typed: Vec<(&str, &str)> = all_instructions(tx)
        .filter_map(|ix| ix.instruction_type().map(|t| (ix.program_id.as_str(), t)))
        .collect();
    let find_instruction = |kinds: &[&str]| {
        typed
            .iter()
            .find(|(_, kind)| kinds.iter().any(|k| k == kind))
            .map(|(id, _)| *id)
    };

    if let Some(id) = find(|name| name == "METAPLEX_METADATA") {
        return (ActivityType::Mint, Some(id));
    }
    if let Some(id) = find_instruction(MINT_INSTRUCTIONS) {
        return (ActivityType::Mint, Some(id));
    }
    if let Some(id) = find_instruction(ACCOUNT_CREATION_INSTRUCTIONS) {
        return (ActivityType::AccountCreation, Some(id));
    }
    if let Some(id) = find_instruction(TRANSFER_INSTRUCTIONS) {
        return (ActivityType::Transfer, Some(id));
    }

    let primary = named
        .iter()
        .find(|(_, name)| !is_core_protocol(name))
        .or_else(|| named.first())
        .map(|(id, _)| *id);
    (ActivityType::Other, primary)
}

fn adds_liquidity(tx: &RpcTransaction) -> bool {
    tx.meta
        .as_ref()
        .and_then(|meta| meta.log_messages.as_ref())
        .into_iter()
        .flatten()
        .map(|line| line.to_lowercase())
        .any(|line| LIQUIDITY_LOG_MARKERS.iter().any(|marker| line.contains(marker)))
}

/// Token and amount the wallet moved.
///
/// The largest token balance change owned by the wallet wins; otherwise the
/// SOL change net of the fee the wallet paid.
fn wallet_movement(address: &str, tx: &RpcTransaction) -> (Option<String>, Option<f64>) {
    let Some(meta) = tx.meta.as_ref() else {
        return (None, None);
    };

    let mut token_deltas: HashMap<&str, f64> = HashMap::new();
    for balance in meta.pre_token_balances.iter().flatten() {
        if balance.owner.as_deref() == Some(address) {
            *token_deltas.entry(&balance.mint).or_default() -= balance.ui_token_amount.value();
        }
    }
    for balance in meta.post_token_balances.iter().flatten() {
        if balance.owner.as_deref() == Some(address) {
            *token_deltas.entry(&balance.mint).or_default() += balance.ui_token_amount.value();
        }
    }

    let largest = token_deltas
        .into_iter()
        .filter(|(_, delta)| delta.abs() > MIN_TOKEN_DELTA)
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()).then_with(|| b.0.cmp(a.0)));
    if let Some((mint, delta)) = largest {
        return (Some(mint.to_string()), Some(delta.abs()));
    }

    let account_keys = &tx.transaction.message.account_keys;
    let Some(index) = account_keys.iter().position(|key| key.pubkey == address) else {
        return (None, None);
    };
    let (Some(pre), Some(post)) = (meta.pre_balances.get(index), meta.post_balances.get(index))
    else {
        return (None, None);
    };

    let mut delta = *post as i128 - *pre as i128;
    // Index 0 is the fee payer
    if index == 0 {
        delta += meta.fee as i128;
    }

    if delta == 0 {
        (None, None)
    } else {
        (Some("SOL".to_string()), Some(delta.unsigned_abs() as f64 / LAMPORTS_PER_SOL))
    }
}
