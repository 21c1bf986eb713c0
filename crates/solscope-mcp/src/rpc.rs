//! Solana JSON-RPC client
//!
//! Thin client over the two RPC methods the analytics need:
//! `getSignaturesForAddress` and `getTransaction` (jsonParsed).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RpcConfig;
use crate::error::{McpError, Result};

/// Largest page `getSignaturesForAddress` accepts
pub const MAX_SIGNATURES_PER_REQUEST: usize = 1000;

/// Characters of an upstream error body kept in error messages
const ERROR_BODY_CHARS: usize = 200;

// ============================================================================
// RPC Client
// ============================================================================

pub struct SolanaRpc {
    client: Client,
    url: String,
    timeout_seconds: u64,
    max_retries: u32,
    next_id: AtomicU64,
}

impl SolanaRpc {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| McpError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(url = %config.url, "Creating Solana RPC client");

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Most recent signatures for an address, newest first
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>> {
        let start = Instant::now();
        let limit = limit.min(MAX_SIGNATURES_PER_REQUEST);

        let signatures: Vec<SignatureInfo> = self
            .call(
                "getSignaturesForAddress",
                json!([address, { "limit": limit }]),
            )
            .await?;

        tracing::info!(
            wallet = %address,
            count = signatures.len(),
            duration_ms = %start.elapsed().as_millis(),
            "Fetched signatures"
        );

        Ok(signatures)
    }

    /// A single transaction, or `None` when the cluster no longer has it
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<RpcTransaction>> {
        let start = Instant::now();

        let transaction: Option<RpcTransaction> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "jsonParsed",
                        "maxSupportedTransactionVersion": 0,
                        "commitment": "confirmed"
                    }
                ]),
            )
            .await?;

        tracing::debug!(
            signature = %signature,
            found = transaction.is_some(),
            duration_ms = %start.elapsed().as_millis(),
            "Fetched transaction"
        );

        Ok(transaction)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let mut attempt = 0;
        let response = loop {
            match self.client.post(&self.url).json(&body).send().await {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries && (e.is_timeout() || e.is_connect()) => {
                    attempt += 1;
                    tracing::warn!(method = %method, attempt, error = %e, "Retrying RPC request");
                }
                Err(e) => return Err(self.transport_error(method, e)),
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!(method = %method, status = %status, "RPC HTTP error");
            return Err(McpError::Rpc(format!(
                "{} returned HTTP {}: {}",
                method,
                status,
                text.chars().take(ERROR_BODY_CHARS).collect::<String>()
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        if let Some(error) = envelope.error {
            tracing::error!(method = %method, code = error.code, message = %error.message, "RPC error");
            return Err(McpError::Rpc(format!(
                "{} failed: {} (code {})",
                method, error.message, error.code
            )));
        }

        Ok(serde_json::from_value(envelope.result)?)
    }

    fn transport_error(&self, method: &str, error: reqwest::Error) -> McpError {
        if error.is_timeout() {
            tracing::error!(method = %method, timeout_s = self.timeout_seconds, "RPC request timed out");
            McpError::Timeout(self.timeout_seconds)
        } else {
            tracing::error!(method = %method, error = %error, "RPC request failed");
            McpError::Rpc(format!("{} request failed: {}", method, error))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

// ============================================================================
// RPC Types - jsonParsed transaction format
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: EncodedTransaction,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructions>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    pub fn value(&self) -> f64 {
        self.ui_amount
            .or_else(|| self.ui_amount_string.as_deref().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerInstructions {
    pub instructions: Vec<ParsedInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncodedTransaction {
    pub message: ParsedMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    pub program_id: String,
    /// Decoded instruction for programs the node understands. A bare string
    /// for memos.
    #[serde(default)]
    pub parsed: Option<Value>,
}

impl ParsedInstruction {
    /// Decoded instruction type, e.g. `transfer` or `createAccount`
    pub fn instruction_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }
}
