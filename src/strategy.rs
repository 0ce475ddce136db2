//! Profit evaluation of listing events against the banking catalog.
//!
//! A listing is worth reporting when flipping it through the bank clears a
//! positive margin: buy cheap from a seller and hand the item in, or pull
//! the item out of the bank and fill a buyer's order. The bank's stock
//! limits gate both directions before any price math happens.

use tracing::debug;

use crate::currency;
use crate::types::{Catalog, CatalogEntry, HalfScrap, Intent, ListingEvent, Opportunity};

/// Evaluate one listing against its catalog entry.
///
/// The listing price is normalized to half-scrap with the current key rate
/// before comparison. Sell-intent listings need the bank to have room for
/// one more of the item; buy-intent listings need the bank to have stock
/// left. Only margins above zero are reported.
pub fn evaluate(
    event: &ListingEvent,
    entry: &CatalogEntry,
    key_price: HalfScrap,
) -> Option<Opportunity> {
    let price = currency::keys_to_half_scrap(event.keys, key_price)
        + currency::refined_to_half_scrap(event.metal);

    let profit = match event.intent {
        // Someone is selling: buy from them, hand in to the bank.
        Intent::Sell => {
            if !entry.bank_has_room() {
                return None;
            }
            entry.price_to_sell - price
        }
        // Someone is buying: pull from the bank, sell to them.
        Intent::Buy => {
            if !entry.bank_has_stock() {
                return None;
            }
            price - entry.price_to_buy
        }
    };

    if profit > 0 {
        Some(Opportunity {
            item_name: event.item_name.clone(),
            intent: event.intent,
            profit,
            url: event.url.clone(),
        })
    } else {
        None
    }
}

/// Evaluate a batch of events, skipping items the catalog does not carry.
pub fn scan(events: &[ListingEvent], catalog: &Catalog, key_price: HalfScrap) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    for event in events {
        let entry = match catalog.get(&event.item_name) {
            Some(entry) => entry,
            None => {
                debug!(item = %event.item_name, "Listing for unbanked item, skipped");
                continue;
            }
        };

        if let Some(opportunity) = evaluate(event, entry, key_price) {
            opportunities.push(opportunity);
        }
    }

    opportunities
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
