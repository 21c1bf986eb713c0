//! MCP tool definitions and request handling
//!
//! This module defines all available tools and handles MCP protocol messages.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solscope_core::{
    format_activity_history, format_transaction_details, format_wallet_analysis, RiskProfile,
};

use crate::analytics::WalletService;
use crate::error::{validate_signature, validate_wallet, McpError};

/// Bounds for the `limit` argument of `fetchWalletActivity`
pub const MIN_LIMIT: u64 = 1;
pub const MAX_LIMIT: u64 = 100;

// =============================================================================
// MCP Protocol Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

// =============================================================================
// Solscope Tools
// =============================================================================

pub struct SolscopeTools {
    service: Arc<WalletService>,
}

impl SolscopeTools {
    pub fn new(service: Arc<WalletService>) -> Self {
        Self { service }
    }

    /// Get all available tools
    pub fn get_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "fetchWalletActivity".to_string(),
                description: "Fetch recent on-chain activity for a Solana wallet and summarize it: transaction types, protocols used and the most recent transactions.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "address": {
                            "type": "string",
                            "description": "Solana wallet address (base58 encoded)"
                        },
                        "limit": {
                            "type": "integer",
                            "minimum": MIN_LIMIT,
                            "maximum": MAX_LIMIT,
                            "description": format!(
                                "Number of recent transactions to fetch (default: {})",
                                self.service.default_limit()
                            )
                        }
                    },
                    "required": ["address"]
                }),
            },
            Tool {
                name: "analyzeWallet".to_string(),
                description: "Analyze a Solana wallet: risk profile, behavioral patterns, inferred DeFi positions and recommended strategies.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "address": {
                            "type": "string",
                            "description": "Solana wallet address (base58 encoded)"
                        },
                        "riskProfile": {
                            "type": "string",
                            "enum": ["conservative", "moderate", "aggressive"],
                            "description": "Risk tolerance for strategy recommendations (default: inferred from activity)"
                        }
                    },
                    "required": ["address"]
                }),
            },
            Tool {
                name: "getTransactionDetails".to_string(),
                description: "Decode a single Solana transaction: status, fee, programs invoked, balance changes and logs.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "signature": {
                            "type": "string",
                            "description": "Transaction signature (base58 encoded)"
                        }
                    },
                    "required": ["signature"]
                }),
            },
            Tool {
                name: "health".to_string(),
                description: "Check the health status of the Solscope server".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        ]
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: &Value) -> Result<Value, String> {
        tracing::info!(tool = %name, "Tool call");

        match name {
            "fetchWalletActivity" => {
                let address = args["address"].as_str().ok_or("Missing address parameter")?;
                validate_wallet(address).map_err(|e| e.to_string())?;
                let limit = parse_limit(&args["limit"], self.service.default_limit())
                    .map_err(|e| e.to_string())?;

                let activities = self
                    .service
                    .fetch_activity(address, limit)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Value::String(format_activity_history(address, &activities, Utc::now())))
            }

            "analyzeWallet" => {
                let address = args["address"].as_str().ok_or("Missing address parameter")?;
                validate_wallet(address).map_err(|e| e.to_string())?;
                let risk_profile = args["riskProfile"].as_str().map(RiskProfile::parse_lenient);

                let analysis = self
                    .service
                    .analyze_wallet(address, risk_profile)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Value::String(format_wallet_analysis(&analysis, Utc::now())))
            }

            "getTransactionDetails" => {
                let signature = args["signature"].as_str().ok_or("Missing signature parameter")?;
                validate_signature(signature).map_err(|e| e.to_string())?;

                let details = self
                    .service
                    .transaction_details(signature)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Value::String(format_transaction_details(&details, Utc::now())))
            }

            "health" => Ok(json!({
                "status": "healthy",
                "timestamp": Utc::now().to_rfc3339(),
                "version": env!("CARGO_PKG_VERSION"),
                "rpc_url": self.service.rpc_url(),
                "cache_entries": self.service.cache().entry_count()
            })),

            _ => Err(format!("Unknown tool: {}", name)),
        }
    }
}

fn parse_limit(value: &Value, default: usize) -> Result<usize, McpError> {
    if value.is_null() {
        return Ok(default);
    }
    match value.as_u64() {
        Some(limit) if (MIN_LIMIT..=MAX_LIMIT).contains(&limit) => Ok(limit as usize),
        _ => Err(McpError::InvalidParameter(format!(
            "limit must be an integer between {} and {}",
            MIN_LIMIT, MAX_LIMIT
        ))),
    }
}

// =============================================================================
// MCP Protocol Handlers
// =============================================================================

fn handle_initialize(_params: &Value) -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "solscope-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn handle_list_tools(tools: &SolscopeTools) -> Value {
    json!({
        "tools": tools.get_tools()
    })
}

async fn handle_call_tool(tools: &SolscopeTools, params: &Value) -> Value {
    let name = params["name"].as_str().unwrap_or("");
    let args = &params["arguments"];

    match tools.execute(name, args).await {
        Ok(result) => {
            let text = match result {
                Value::String(markdown) => markdown,
                other => serde_json::to_string_pretty(&other).unwrap_or_default(),
            };
            json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            })
        }
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "Tool call failed");
            json!({
                "content": [{
                    "type": "text",
                    "text": format!("Error: {}", e)
                }],
                "isError": true
            })
        }
    }
}

/// Error response for a message that is not valid JSON-RPC
pub fn parse_error_response(message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id: Value::Null,
        result: None,
        error: Some(JsonRpcError {
            code: -32700,
            message: format!("Parse error: {}", message),
        }),
    }
}

/// Handle an incoming MCP request
pub async fn handle_request(
    tools: &SolscopeTools,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let result = match request.method.as_str() {
        "initialize" => Some(handle_initialize(&request.params)),
        "initialized" | "notifications/initialized" => None,
        "tools/list" => Some(handle_list_tools(tools)),
        "tools/call" => Some(handle_call_tool(tools, &request.params).await),
        "notifications/cancelled" => None,
        _ => {
            return Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32601,
                    message: format!("Method not found: {}", request.method),
                }),
            });
        }
    };

    result.map(|r| JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id: request.id,
        result: Some(r),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::WalletCache;
    use crate::config::{CacheConfig, RpcConfig};
    use crate::fixtures::{self, MockRpc};
    use crate::rpc::SolanaRpc;

    fn tools(url: String) -> SolscopeTools {
        let rpc = SolanaRpc::new(&RpcConfig {
            url,
            timeout_seconds: 5,
            max_retries: 0,
            default_limit: 20,
        })
        .unwrap();
        let cache = WalletCache::new(&CacheConfig {
            max_capacity: 100,
            ttl_seconds: 60,
        });
        SolscopeTools::new(Arc::new(WalletService::new(rpc, cache, 20)))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params,
        }
    }

    async fn call(tools: &SolscopeTools, name: &str, arguments: Value) -> Value {
        let response = handle_request(
            tools,
            request("tools/call", json!({ "name": name, "arguments": arguments })),
        )
        .await
        .unwrap();
        response.result.unwrap()
    }

    fn text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let tools = tools("http://127.0.0.1:9".to_string());

        let init = handle_request(&tools, request("initialize", json!({}))).await.unwrap();
        assert_eq!(init.result.unwrap()["serverInfo"]["name"], "solscope-mcp");

        let list = handle_request(&tools, request("tools/list", json!({}))).await.unwrap();
        let names: Vec<String> = list.result.unwrap()["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["fetchWalletActivity", "analyzeWallet", "getTransactionDetails", "health"]
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let tools = tools("http://127.0.0.1:9".to_string());
        let notification: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(handle_request(&tools, notification).await.is_none());
    }

    #[test]
    fn test_parse_error_response() {
        let err = serde_json::from_str::<JsonRpcRequest>("{not json").unwrap_err();
        let response = serde_json::to_value(parse_error_response(&err.to_string())).unwrap();

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["error"]["message"].as_str().unwrap().starts_with("Parse error"));
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let tools = tools("http://127.0.0.1:9".to_string());
        let response = handle_request(&tools, request("resources/list", json!({})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_invalid_address_is_tool_error() {
        let tools = tools("http://127.0.0.1:9".to_string());
        let result = call(&tools, "analyzeWallet", json!({ "address": "not-a-wallet" })).await;

        assert_eq!(result["isError"], true);
        assert!(text(&result).starts_with("Error: Invalid parameter"));
    }

    #[tokio::test]
    async fn test_limit_out_of_range() {
        let tools = tools("http://127.0.0.1:9".to_string());
        for limit in [json!(0), json!(101), json!("ten")] {
            let result = call(
                &tools,
                "fetchWalletActivity",
                json!({ "address": fixtures::wallet(), "limit": limit }),
            )
            .await;
            assert_eq!(result["isError"], true);
            assert!(text(&result).contains("limit"));
        }
    }

    #[tokio::test]
    async fn test_rpc_failure_is_tool_error() {
        let tools = tools("http://127.0.0.1:9".to_string());
        let result = call(&tools, "fetchWalletActivity", json!({ "address": fixtures::wallet() })).await;
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_fetch_then_analyze() {
        let mock = MockRpc::spawn().await;
        let tools = tools(mock.url());

        let history = call(
            &tools,
            "fetchWalletActivity",
            json!({ "address": fixtures::wallet(), "limit": 5 }),
        )
        .await;
        assert!(history.get("isError").is_none());
        assert!(text(&history).contains("- **Total Transactions:** 2"));
        assert!(text(&history).contains("- **RAYDIUM_SWAP:** 1 transactions"));

        let analysis = call(&tools, "analyzeWallet", json!({ "address": fixtures::wallet() })).await;
        let markdown = text(&analysis);
        assert!(markdown.contains("Wallet Analysis"));
        assert!(markdown.contains("insufficient_data"));
        assert!(markdown.contains("Trading Statistics on Aggregate"));
    }

    #[tokio::test]
    async fn test_transaction_details_tool() {
        let mock = MockRpc::spawn().await;
        let tools = tools(mock.url());

        let result = call(
            &tools,
            "getTransactionDetails",
            json!({ "signature": fixtures::swap_signature() }),
        )
        .await;
        assert!(text(&result).contains("- **Fee:** 0.000005 SOL"));
        assert!(text(&result).contains("(RAYDIUM_SWAP)"));

        let missing = call(
            &tools,
            "getTransactionDetails",
            json!({ "signature": fixtures::missing_signature() }),
        )
        .await;
        assert_eq!(missing["isError"], true);
        assert!(text(&missing).contains("Not found"));
    }

    #[tokio::test]
    async fn test_health_tool() {
        let tools = tools("http://127.0.0.1:9".to_string());
        let result = call(&tools, "health", json!({})).await;
        let health: Value = serde_json::from_str(text(&result)).unwrap();

        assert_eq!(health["status"], "healthy");
        assert_eq!(health["rpc_url"], "http://127.0.0.1:9");
        assert!(health["cache_entries"].is_u64());
    }
}
