// Electricity Board Portal - Web Server
// JSON API over one in-memory portal

use anyhow::{Context, Result};
use eb_portal::server::{router, AppState};
use eb_portal::{logging, Portal, PortalConfig, BRAND, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stdout();

    let config = PortalConfig::from_env().context("Failed to read configuration")?;
    let addr = config.bind_addr.clone();

    tracing::info!(
        version = VERSION,
        settlement_ms = config.settlement_delay.as_millis() as u64,
        "starting {} API",
        BRAND
    );

    let state = AppState::new(Portal::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "portal API listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/bills", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
