//! Scrapyard — TF2 item-banking arbitrage bot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects the three market clients, builds the initial catalog, and
//! runs the notification-polling loop with graceful shutdown.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{error, info};

use scrapyard::aliases;
use scrapyard::catalog;
use scrapyard::config::AppConfig;
use scrapyard::platforms;
use scrapyard::platforms::backpack::BackpackClient;
use scrapyard::platforms::prices::PricesClient;
use scrapyard::platforms::scrap::ScrapClient;
use scrapyard::strategy;
use scrapyard::types::Intent;

const BANNER: &str = r#"
 ____    ____  ____      _     ____  __   __    _     ____   ____
/ ___|  / ___||  _ \    / \   |  _ \ \ \ / /   / \   |  _ \ |  _ \
\___ \ | |    | |_) |  / _ \  | |_) | \ V /   / _ \  | |_) || | | |
 ___) || |___ |  _ <  / ___ \ |  __/   | |   / ___ \ |  _ < | |_| |
|____/  \____||_| \_\/_/   \_\|_|      |_|  /_/   \_\|_| \_\|____/

  Scrap-bank arbitrage scanner for the TF2 economy
  v0.1.0
"#;

/// How often unread notifications are drained.
const POLL_INTERVAL: Duration = Duration::from_millis(700);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from the environment
    let cfg = AppConfig::from_env()?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        update_interval_secs = cfg.update_interval.as_secs(),
        create_alerts = cfg.create_alerts,
        "Scrapyard starting up"
    );

    // -- Connect clients and build initial state --------------------------

    let update_interval = cfg.update_interval;
    let create_alerts = cfg.create_alerts;

    let mut backpack =
        BackpackClient::connect(cfg.backpack_client_id, cfg.backpack_client_secret).await?;
    let mut prices = PricesClient::new()?;
    let scrap = ScrapClient::new()?;

    let aliases = aliases::load_aliases(None)?;

    let mut key_price = platforms::update_key_price(&mut prices).await;

    let page = scrap
        .fetch_items_page()
        .await
        .context("Initial scrap.tf catalog fetch failed")?;
    let mut catalog = catalog::catalog_from_page(&page, &aliases, key_price)?;

    if create_alerts {
        info!(items = catalog.len(), "Creating alerts for banked items");
        for name in catalog.keys() {
            for &intent in Intent::ALL {
                backpack.create_alert(name, intent).await;
            }
        }
    }

    // -- Main loop ---------------------------------------------------------

    let mut tick = tokio::time::interval(POLL_INTERVAL);
    // A slow refresh must not be followed by a burst of catch-up drains.
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut next_refresh = Instant::now() + update_interval;

    info!(
        poll_millis = POLL_INTERVAL.as_millis() as u64,
        refresh_secs = update_interval.as_secs(),
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let events = backpack.unread_notifications().await;
                for opportunity in strategy::scan(&events, &catalog, key_price) {
                    info!(
                        item = %opportunity.item_name,
                        intent = %opportunity.intent,
                        profit = opportunity.profit,
                        url = %opportunity.url,
                        "Arbitrage opportunity"
                    );
                }

                if Instant::now() >= next_refresh {
                    key_price = platforms::update_key_price(&mut prices).await;
                    match scrap.fetch_items_page().await {
                        Ok(page) => match catalog::catalog_from_page(&page, &aliases, key_price) {
                            Ok(fresh) => catalog = fresh,
                            Err(e) => {
                                error!(error = %e, "Catalog rebuild failed; keeping previous catalog");
                            }
                        },
                        Err(e) => {
                            error!(error = %e, "Could not fetch scrap.tf page; keeping previous catalog");
                        }
                    }
                    next_refresh = Instant::now() + update_interval;
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("Scrapyard shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scrapyard=info"));

    let json_logging = std::env::var("SCRAPYARD_LOG_JSON").is_ok();

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
