//! BANKROLL: append-only wager ledger.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the ledger from the configured store, then either serves the
//! dashboard or prints a one-off report.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use bankroll::config::{self, AppConfig};
use bankroll::dashboard::{self, DashboardState};
use bankroll::engine::{Ledger, LoadNotice, WagerStats};
use bankroll::storage;

/// Rows shown in the printed history.
const HISTORY_ROWS: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    info!(
        backend = %cfg.storage.backend,
        path = %cfg.storage.path,
        starting_balance = %cfg.ledger.starting_balance,
        currency = %cfg.ledger.currency,
        "BANKROLL starting up"
    );

    let store = storage::build_store(&cfg.storage)?;
    let ledger = Ledger::initialize(store, cfg.ledger.starting_balance);
    if let LoadNotice::Reinitialized { reason } = ledger.load_notice() {
        warn!(reason = %reason, "Stored ledger was unusable; it will be overwritten on the next append");
    }

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(ledger, cfg.ledger.currency.clone()));
        dashboard::serve(state, cfg.dashboard.port).await?;
        info!("BANKROLL shut down cleanly.");
    } else {
        print_report(&ledger, &cfg.ledger);
    }

    Ok(())
}

/// Print balance, statistics and recent history to stdout.
fn print_report(ledger: &Ledger, cfg: &config::LedgerConfig) {
    let currency = &cfg.currency;

    println!("Balance: {:.2} {currency}", ledger.current_balance());
    match WagerStats::from_events(ledger.events()) {
        Some(stats) => {
            println!("Net profit (wagers): {:.2} {currency}", stats.net_wager_profit);
            println!("Wagers: {}", stats.wager_count);
            println!("Total staked: {:.2} {currency}", stats.total_staked);
            println!("ROI: {:.2} %", stats.return_on_investment);
            println!("Win rate: {:.2} %", stats.win_rate);
        }
        None => println!("No statistics yet: record a first wager or a deposit."),
    }

    println!();
    println!("Last {HISTORY_ROWS} events:");
    for event in ledger.recent(HISTORY_ROWS) {
        println!("  {event}");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bankroll=info"));

    let json_logging = std::env::var("BANKROLL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
