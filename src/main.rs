// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use eb_portal::VERSION;
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "version") {
        println!("eb-portal {}", VERSION);
        return Ok(());
    }

    run_ui_mode()
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use eb_portal::config::ENV_LOG_FILE;
    use eb_portal::{logging, Portal, PortalConfig, BRAND};

    let config = PortalConfig::from_env()?;
    let logging_enabled = logging::init_from_env()?;
    tracing::info!(version = VERSION, "starting portal TUI");

    println!("⚡ {}", BRAND);
    if logging_enabled {
        println!("✓ Logging to the file named by {}", ENV_LOG_FILE);
    }
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(Portal::new(config));
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin portal-server --features server");
    std::process::exit(1);
}
