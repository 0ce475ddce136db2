//! External platform integrations.
//!
//! One module per surface the bot talks to:
//! - backpack.tf — OAuth2 marketplace API (alerts + notification drain)
//! - prices.tf — bearer-token quote service for the live key rate
//! - scrap.tf — the scraped item-banking page (no API exists)

pub mod backpack;
pub mod prices;
pub mod scrap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::types::HalfScrap;

/// Abstraction over the key-rate quote source.
///
/// A single call either yields the current sell price of one key in
/// half-scrap, or `None` once the implementation has spent its one
/// auth-refresh retry. Callers that cannot proceed without a rate keep
/// asking.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Current sell price of one key in half-scrap, if obtainable.
    async fn key_sell_price(&mut self) -> Option<HalfScrap>;
}

/// Block until the quote service yields a key price.
///
/// Retries immediately: no backoff, no attempt cap. Conversions must never
/// run without a rate, so a dead quote service stalls the refresh here.
pub async fn update_key_price(quotes: &mut impl QuoteService) -> HalfScrap {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Some(price) = quotes.key_sell_price().await {
            debug!(price, attempts, "Key price updated");
            return price;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
