//! Solscope MCP Server
//!
//! Model Context Protocol server exposing Solana wallet analytics to AI
//! agents: activity history, behavioral patterns, inferred DeFi positions and
//! strategy recommendations, rendered as markdown.
//!
//! # Transports
//!
//! - **stdio** (default): one JSON-RPC message per line on stdin/stdout
//! - **http**: `POST /mcp` and `GET /health`

mod analytics;
mod cache;
mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod http;
mod parser;
mod rpc;
mod tools;

use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::WalletService;
use crate::cache::WalletCache;
use crate::config::{AppConfig, Transport};
use crate::rpc::SolanaRpc;
use crate::tools::{handle_request, parse_error_response, JsonRpcRequest, SolscopeTools};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the MCP protocol
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("solscope_mcp=info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Solscope MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using default configuration");
        AppConfig::default()
    });

    tracing::info!(
        rpc_url = %config.rpc.url,
        transport = ?config.server.transport,
        cache_ttl_s = config.cache.ttl_seconds,
        "Configuration loaded"
    );

    let rt = Runtime::new()?;

    let rpc = SolanaRpc::new(&config.rpc)?;
    let cache = WalletCache::new(&config.cache);
    let service = Arc::new(WalletService::new(rpc, cache, config.rpc.default_limit));
    let tools = Arc::new(SolscopeTools::new(service));

    if config.server.transport == Transport::Http {
        let addr: SocketAddr = config.server_addr().parse()?;
        return rt.block_on(http::serve(addr, tools));
    }

    tracing::info!("MCP server ready, listening on stdio");

    // Main loop: read JSON-RPC requests from stdin, write responses to stdout
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Error reading stdin");
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => {
                tracing::debug!(method = %request.method, "Received request");
                let tools = Arc::clone(&tools);
                rt.block_on(async move { handle_request(&tools, request).await })
            }
            Err(e) => {
                tracing::error!(error = %e, line = %line, "Error parsing request");
                Some(parse_error_response(&e.to_string()))
            }
        };

        // Notifications get no response
        if let Some(response) = response {
            let response_str = serde_json::to_string(&response)?;
            if let Err(e) = writeln!(stdout, "{}", response_str) {
                tracing::error!(error = %e, "Error writing response");
            }
            if let Err(e) = stdout.flush() {
                tracing::error!(error = %e, "Error flushing stdout");
            }
        }
    }

    tracing::info!("MCP server shutting down");
    Ok(())
}
