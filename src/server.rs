use rmcp::ServiceExt;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use tracing_subscriber::{self, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use anyhow::Result;

use crate::config::Config;
use crate::mcp::OcamlDocs;

/// Log to stderr, honoring `RUST_LOG` and falling back to `default_level`.
///
/// stdout stays free for the stdio transport and for one-shot results.
pub fn init_stderr_tracing(default_level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

// start sse server
pub async fn start_sse_server(addr: &str, config: Config) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service = OcamlDocs::new(config)?;
    tracing::info!("Starting SSE server on {}", addr);
    let ct = SseServer::serve(addr.parse()?)
        .await?
        .with_service(move || service.clone());

    tokio::signal::ctrl_c().await?;
    ct.cancel();
    Ok(())
}

// start stdio server
pub async fn start_stdio_server(config: Config) -> Result<()> {
    init_stderr_tracing(tracing::Level::DEBUG);

    tracing::info!("Starting MCP server");

    let service = OcamlDocs::new(config)?.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
