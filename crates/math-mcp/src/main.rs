//! MCP server exposing the built-in math tools over stdio.
//!
//! stdout carries the protocol; logs go to stderr.

use runtime::tools::math;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> runtime::Result<()> {
    let registry = math::registry()?;
    info!(tools = registry.len(), "math-mcp serving on stdio");

    mcp::serve(
        &registry,
        mcp::Implementation::new("math-mcp", env!("CARGO_PKG_VERSION")),
        tokio::io::stdin(),
        tokio::io::stdout(),
    )
    .await?;

    info!("math-mcp stopped");
    Ok(())
}
