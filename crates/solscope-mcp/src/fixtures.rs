//! Sample RPC payloads and an in-process mock RPC endpoint for tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

pub const SLOT: u64 = 270_000_000;

/// 2024-06-01 12:00:00 UTC
pub const SWAP_BLOCK_TIME: i64 = 1_717_243_200;
pub const TRANSFER_BLOCK_TIME: i64 = SWAP_BLOCK_TIME - 3_600;

pub const RAYDIUM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub fn wallet() -> String {
    bs58::encode([9u8; 32]).into_string()
}

pub fn counterparty() -> String {
    bs58::encode([8u8; 32]).into_string()
}

fn signature(seed: u8) -> String {
    bs58::encode([seed; 64]).into_string()
}

pub fn swap_signature() -> String {
    signature(1)
}

pub fn transfer_signature() -> String {
    signature(2)
}

/// Known to the mock but pruned from its ledger
pub fn missing_signature() -> String {
    signature(3)
}

/// Answered by the mock with a JSON-RPC error object
pub fn error_signature() -> String {
    signature(4)
}

fn token_balance(account_index: usize, mint: &str, ui_amount: Option<f64>, ui_amount_string: &str, decimals: u8) -> Value {
    json!({
        "accountIndex": account_index,
        "mint": mint,
        "owner": wallet(),
        "uiTokenAmount": {
            "uiAmount": ui_amount,
            "uiAmountString": ui_amount_string,
            "decimals": decimals
        }
    })
}

fn token_transfer(amount: &str) -> Value {
    json!({
        "program": "spl-token",
        "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
        "parsed": { "type": "transfer", "info": { "amount": amount } }
    })
}

/// Raydium swap of 10 USDC into 0.5 wrapped SOL, paid by the wallet
pub fn swap_transaction() -> Value {
    let logs = vec![
        "Program ComputeBudget111111111111111111111111111111 invoke [1]".to_string(),
        "Program ComputeBudget111111111111111111111111111111 success".to_string(),
        format!("Program {} invoke [1]", RAYDIUM),
        "Program log: ray_log: A0BCDEF".to_string(),
        "Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [2]".to_string(),
        "Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA success".to_string(),
        format!("Program {} success", RAYDIUM),
    ];

    let meta = json!({
        "err": null,
        "fee": 5000,
        "preBalances": [2_000_000_000u64, 2_039_280u64, 1u64],
        "postBalances": [1_999_995_000u64, 2_039_280u64, 1u64],
        "preTokenBalances": [token_balance(1, USDC_MINT, Some(10.0), "10", 6)],
        "postTokenBalances": [
            token_balance(1, USDC_MINT, None, "0", 6),
            token_balance(2, WSOL_MINT, Some(0.5), "0.5", 9)
        ],
        "logMessages": logs,
        "innerInstructions": [
            {
                "index": 1,
                "instructions": [token_transfer("10000000"), token_transfer("500000000")]
            }
        ]
    });

    let message = json!({
        "accountKeys": [
            { "pubkey": wallet(), "signer": true, "writable": true },
            { "pubkey": counterparty(), "signer": false, "writable": true },
            { "pubkey": RAYDIUM, "signer": false, "writable": false }
        ],
        "instructions": [
            {
                "programId": "ComputeBudget111111111111111111111111111111",
                "accounts": [],
                "data": "3DTZbgwsozUF"
            },
            {
                "programId": RAYDIUM,
                "accounts": [counterparty()],
                "data": "6Hd1W3DqqqXk"
            }
        ]
    });

    json!({
        "slot": SLOT,
        "blockTime": SWAP_BLOCK_TIME,
        "meta": meta,
        "transaction": { "signatures": [swap_signature()], "message": message }
    })
}

/// Plain 1 SOL system transfer from the wallet
pub fn transfer_transaction() -> Value {
    let meta = json!({
        "err": null,
        "fee": 5000,
        "preBalances": [3_000_000_000u64, 0u64, 1u64],
        "postBalances": [1_999_995_000u64, 1_000_000_000u64, 1u64],
        "preTokenBalances": [],
        "postTokenBalances": [],
        "logMessages": [
            "Program 11111111111111111111111111111111 invoke [1]",
            "Program 11111111111111111111111111111111 success"
        ],
        "innerInstructions": []
    });

    let transfer = json!({
        "program": "system",
        "programId": "11111111111111111111111111111111",
        "parsed": {
            "type": "transfer",
            "info": { "source": wallet(), "destination": counterparty(), "lamports": 1_000_000_000u64 }
        }
    });

    let message = json!({
        "accountKeys": [
            { "pubkey": wallet(), "signer": true, "writable": true },
            { "pubkey": counterparty(), "signer": false, "writable": true },
            { "pubkey": "11111111111111111111111111111111", "signer": false, "writable": false }
        ],
        "instructions": [transfer]
    });

    json!({
        "slot": SLOT - 9_000,
        "blockTime": TRANSFER_BLOCK_TIME,
        "meta": meta,
        "transaction": { "signatures": [transfer_signature()], "message": message }
    })
}

// ============================================================================
// Mock RPC endpoint
// ============================================================================

/// JSON-RPC endpoint serving the fixtures above on a random local port
pub struct MockRpc {
    addr: SocketAddr,
    calls: Arc<AtomicUsize>,
}

impl MockRpc {
    pub async fn spawn() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(Arc::clone(&calls));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, calls }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of JSON-RPC requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Endpoint answering every request with a fixed status and plain-text body
pub async fn spawn_status_endpoint(status: StatusCode, body: String) -> String {
    let app = Router::new().route("/", post(move || async move { (status, body) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn handle_rpc(State(calls): State<Arc<AtomicUsize>>, Json(request): Json<Value>) -> Json<Value> {
    calls.fetch_add(1, Ordering::SeqCst);

    let id = request["id"].clone();
    let first_param = request["params"][0].as_str().unwrap_or_default().to_string();

    let result = match request["method"].as_str().unwrap_or_default() {
        "getSignaturesForAddress" if first_param == wallet() => json!([
            { "signature": swap_signature(), "slot": SLOT, "err": null, "blockTime": SWAP_BLOCK_TIME, "memo": null },
            { "signature": transfer_signature(), "slot": SLOT - 9_000, "err": null, "blockTime": TRANSFER_BLOCK_TIME, "memo": null }
        ]),
        "getSignaturesForAddress" => json!([]),
        "getTransaction" if first_param == swap_signature() => swap_transaction(),
        "getTransaction" if first_param == transfer_signature() => transfer_transaction(),
        "getTransaction" if first_param == error_signature() => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32602, "message": "Invalid param: WrongSize" }
            }));
        }
        _ => Value::Null,
    };

    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}
