/// Workflow upload server
///
/// Main entry point. Loads configuration from the environment and serves:
/// - Workflow version upload at POST /upload (with OPTIONS preflight)
/// - Health check at /healthz

use workflow_upload::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // JWT_SECRET is required; everything else has a default
    let config = Config::from_env()?;

    start_server(config).await?;

    Ok(())
}
