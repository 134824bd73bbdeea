//! PRICEWATCH: product page price monitor.
//!
//! Entry point. Parses the CLI, loads configuration, initialises
//! structured logging, wires the page source, journal and notifiers
//! together, and runs the poll loop until Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pricewatch::config::AppConfig;
use pricewatch::journal::PriceJournal;
use pricewatch::monitor::PriceMonitor;
use pricewatch::notify::telegram::TelegramNotifier;
use pricewatch::notify::{desktop, Notifier};
use pricewatch::scrape::{HttpPageSource, PriceExtractor};
use pricewatch::types::MonitorState;

const BANNER: &str = r#"
 ___ ___ ___ ___ ___ _ _ _  _ _____ ___ _  _
| _ \ _ \_ _/ __| __| | | |/_\_   _/ __| || |
|  _/   /| | (__| _|| V V / _ \| || (__| __ |
|_| |_|_\___\___|___|\_/\_/_/ \_\_| \___|_||_|

  Product price monitor, v0.1.0
"#;

#[derive(Debug, Parser)]
#[command(name = "pricewatch", version, about = "Monitor a product page for price changes")]
struct Cli {
    /// Verbose debug output and a countdown between checks.
    #[arg(long)]
    debug: bool,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let loaded = AppConfig::load_optional(&cli.config)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();
    let debug_enabled = cli.debug || cfg.monitor.debug;

    init_logging(debug_enabled);
    if !config_found {
        info!(path = %cli.config, "No config file found, using defaults");
    }

    println!("{BANNER}");
    info!(
        product = %cfg.product.name,
        url = %cfg.product.url,
        interval_secs = cfg.monitor.interval_secs,
        log_file = %cfg.monitor.log_file,
        debug = debug_enabled,
        "PRICEWATCH starting up"
    );

    // -- Initialise components -------------------------------------------

    let source = HttpPageSource::new(&cfg.product, cfg.request_timeout())
        .context("Failed to set up product page source")?;
    let extractor = PriceExtractor::new(&cfg.selectors).context("Invalid price selectors")?;
    let journal = PriceJournal::new(&cfg.monitor.log_file);

    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if cfg.alerts.desktop_enabled {
        notifiers.push(desktop::for_current_os());
    }
    if cfg.alerts.telegram_enabled {
        if let Some(telegram) = TelegramNotifier::from_config(&cfg.alerts, cfg.request_timeout())
            .context("Failed to set up Telegram notifier")?
        {
            notifiers.push(Box::new(telegram));
        }
    }

    let mut monitor = PriceMonitor::new(
        Box::new(source),
        extractor,
        journal,
        notifiers,
        cfg.notification_title(),
        MonitorState::new(cfg.interval(), debug_enabled),
    );

    // -- Main loop -------------------------------------------------------

    info!("Entering main loop. Press Ctrl+C to stop.");

    tokio::select! {
        _ = monitor.run() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown signal received.");
        }
    }

    let state = monitor.state();
    info!(
        cycles = state.cycles,
        changes = state.changes,
        steady = state.steady,
        misses = state.misses,
        last_price = state.last_known_price.as_ref().map(|p| p.as_str()).unwrap_or("-"),
        "PRICEWATCH shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(debug: bool) {
    use tracing_subscriber::fmt;

    let env_filter = log_filter(debug, std::env::var("RUST_LOG").ok().as_deref());
    let json_logging = std::env::var("PRICEWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

/// Build the log filter from `RUST_LOG` (if valid) or the crate default.
/// `--debug` always enables this crate's debug lines on top.
fn log_filter(debug: bool, rust_log: Option<&str>) -> EnvFilter {
    let default_filter = if debug { "pricewatch=debug" } else { "pricewatch=info" };
    let mut filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    if debug {
        if let Ok(directive) = "pricewatch=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}
