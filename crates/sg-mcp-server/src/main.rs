//! Entry point: loads configuration, wires the runtime/registry pair, and
//! runs the stdio JSON-RPC dispatch loop (spec.md §6 stdio transport).

use anyhow::Result;
use sg_core::{Config, Runtime};
use sg_mcp_server::{server::McpServer, tools::build_registry, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(None)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    tracing::info!("starting sg-mcp server");

    let runtime = Runtime::new(config);
    let ctx = AppContext::new(runtime);
    let registry = build_registry();

    let server = McpServer::new(ctx, registry);
    server.run().await?;

    Ok(())
}
