use clap::Parser;
use tracing::{error, info};

use mythic_mcp_server::config::{Cli, ServerConfig};
use mythic_mcp_server::mythic::Session;
use mythic_mcp_server::server::McpServer;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match ServerConfig::from_cli(Cli::parse()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mythic-mcp-server: configuration error: {e}");
            std::process::exit(1);
        }
    };

    // stdout carries the MCP stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let session = match Session::login(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!(host = %config.host, port = config.port, "cannot log in to Mythic: {e}");
            eprintln!("mythic-mcp-server: {e}");
            std::process::exit(1);
        }
    };
    info!(operation_id = ?session.current_operation_id(), "serving MCP on stdio");

    let mut server = McpServer::new(session);
    if let Err(e) = server.run().await {
        error!("fatal error: {e}");
        std::process::exit(1);
    }
}
