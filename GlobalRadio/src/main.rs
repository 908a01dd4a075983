use grbrowser::{RadioBrowserConfigExt, RadioBrowserExt};
use grconfig::get_config;
use grserver::{LoggingOptions, ServerBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();

    // ========== PHASE 1 : Infrastructure HTTP ==========
    let mut server = ServerBuilder::new_configured().build();
    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;

    info!(config_dir = %config.config_dir(), "📁 Configuration loaded");

    // ========== PHASE 2 : API radio-browser ==========
    let discovery = config.get_upstream_discovery_host()?;
    if discovery.is_empty() {
        info!("📻 Mirror discovery disabled, using fallback mirrors only");
    } else {
        info!(host = %discovery, "📻 Mirrors will be discovered via DNS");
    }

    server.init_radio_api().await?;

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    let addr = server.start().await?;

    info!(address = %addr, "✅ Global Radio is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
