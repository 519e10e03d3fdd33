use std::time::Duration;

use clap::Parser;

/// Default timeout for a single HTTP request to Mythic (30 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default log filter when neither `RUST_LOG` nor `--log-level` is set.
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("port must be between 1 and 65535")]
    InvalidPort,
    #[error("request timeout must be a positive number of seconds")]
    InvalidRequestTimeout,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "mythic-mcp-server", version, about = "MCP for Mythic")]
pub struct Cli {
    /// Username used to connect to Mythic API
    pub username: String,

    /// Password used to connect to Mythic API
    pub password: String,

    /// Host (IP or DNS) of Mythic API server
    pub host: String,

    /// Port of Mythic server HTTP server
    pub port: u16,

    /// Talk plain HTTP/WS instead of HTTPS/WSS
    #[arg(long, env = "MYTHIC_MCP_NO_SSL")]
    pub no_ssl: bool,

    /// Verify the server certificate (Mythic ships a self-signed one)
    #[arg(long, env = "MYTHIC_MCP_VERIFY_TLS")]
    pub verify_tls: bool,

    /// Max seconds for a single HTTP request
    #[arg(long, env = "MYTHIC_MCP_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "MYTHIC_MCP_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

/// Server configuration resolved from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub verify_tls: bool,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl ServerConfig {
    /// Validate parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let host = cli.host.trim().to_string();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if cli.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if cli.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout);
        }

        Ok(Self {
            username: cli.username,
            password: cli.password,
            host,
            port: cli.port,
            use_ssl: !cli.no_ssl,
            verify_tls: cli.verify_tls,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            log_level: cli.log_level,
        })
    }

    /// `https://host:port` (or `http://` with SSL disabled).
    pub fn http_base(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// `wss://host:port` (or `ws://` with SSL disabled).
    pub fn ws_base(&self) -> String {
        let scheme = if self.use_ssl { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Build the tracing filter: `RUST_LOG` wins, then the configured level.
    pub fn log_filter(&self) -> tracing_subscriber::EnvFilter {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| self.log_level.clone());
        tracing_subscriber::EnvFilter::try_new(level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}
