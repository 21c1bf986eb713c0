//! Configuration management for the Solscope MCP server

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Solana JSON-RPC configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Extra attempts after a transport error or timeout
    #[serde(default)]
    pub max_retries: u32,
    /// Signatures fetched when a tool call gives no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            default_limit: default_limit(),
        }
    }
}

fn default_rpc_url() -> String {
    std::env::var("SOLANA_RPC_URL")
        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000)
}

/// Wallet cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached wallets
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_max_capacity() -> u64 {
    1000
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("rpc.url", default_rpc_url())?
            .set_default("rpc.timeout_seconds", default_timeout() as i64)?
            .set_default("rpc.max_retries", 0)?
            .set_default("rpc.default_limit", default_limit() as i64)?
            .set_default("server.transport", "stdio")?
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("cache.max_capacity", default_max_capacity() as i64)?
            .set_default("cache.ttl_seconds", default_ttl() as i64)?
            // Optional solscope.{toml,yaml,json}
            .add_source(config::File::with_name("solscope").required(false))
            // SOLSCOPE__RPC__URL, SOLSCOPE__SERVER__TRANSPORT, ...
            .add_source(
                config::Environment::with_prefix("SOLSCOPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rpc.timeout_seconds, 30);
        assert_eq!(config.rpc.max_retries, 0);
        assert_eq!(config.rpc.default_limit, 20);
        assert_eq!(config.server.transport, Transport::Stdio);
        assert_eq!(config.cache.ttl_seconds, 300);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"rpc": {"url": "http://localhost:8899"}, "server": {"transport": "http"}}"#,
        )
        .unwrap();

        assert_eq!(config.rpc.url, "http://localhost:8899");
        assert_eq!(config.rpc.timeout_seconds, 30);
        assert_eq!(config.server.transport, Transport::Http);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.max_capacity, 1000);
    }
}
