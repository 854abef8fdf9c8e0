use anyhow::Result;
use cmdguard_mcp::common::guard_server::GuardServer;
use cmdguard_mcp::common::security::{audit_logger, default_rules};
use cmdguard_mcp::config::GuardConfig;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing_subscriber::{self, EnvFilter};

/// Command guard - vets BUILD_COMMAND/FORMATTING_COMMAND, then serves validation tools over MCP
/// Run with: CMDGUARD_COMMAND_SOURCE=ai_generated BUILD_COMMAND="npm test" cargo run
/// Test with: npx @modelcontextprotocol/inspector cargo run
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the tracing subscriber with stderr logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = GuardConfig::from_env()?;
    tracing::info!(source = %config.command_source, "Vetting configured commands");
    config.vet(&default_rules(), &audit_logger())?;

    if !config.serve {
        tracing::info!("Commands vetted, server disabled");
        return Ok(());
    }

    tracing::info!("Starting command guard MCP server");

    #[cfg(feature = "transport-io")]
    let service = GuardServer::new().serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    #[cfg(not(feature = "transport-io"))]
    compile_error!("`transport-io` feature is required for this server to run.");

    tracing::info!("Command guard MCP server is ready and waiting for connections");

    #[cfg(feature = "transport-io")]
    service.waiting().await?;
    Ok(())
}
