//! Error types for the Solscope MCP server

use thiserror::Error;

/// Unified error type for the MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Could not retrieve data from Solana RPC: {0}")]
    Rpc(String),

    #[error("Solana RPC request timed out after {0}s")]
    Timeout(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, McpError>;

const PUBKEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// Validate a Solana wallet address
pub fn validate_wallet(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(McpError::InvalidParameter("Wallet address cannot be empty".into()));
    }
    if address.len() < 32 || address.len() > 44 {
        return Err(McpError::InvalidParameter(
            "Invalid Solana wallet address length".into(),
        ));
    }
    match bs58::decode(address).into_vec() {
        Ok(bytes) if bytes.len() == PUBKEY_LEN => Ok(()),
        _ => Err(McpError::InvalidParameter(format!(
            "'{}' is not a valid Solana address",
            address
        ))),
    }
}

/// Validate a transaction signature
pub fn validate_signature(signature: &str) -> Result<()> {
    if signature.is_empty() {
        return Err(McpError::InvalidParameter("Signature cannot be empty".into()));
    }
    if signature.len() < 64 || signature.len() > 88 {
        return Err(McpError::InvalidParameter(
            "Invalid transaction signature length".into(),
        ));
    }
    match bs58::decode(signature).into_vec() {
        Ok(bytes) if bytes.len() == SIGNATURE_LEN => Ok(()),
        _ => Err(McpError::InvalidParameter(format!(
            "'{}' is not a valid transaction signature",
            signature
        ))),
    }
}
