//! Conversions between keys, refined metal, and half-scrap.
//!
//! Every price in the bot is normalized to half-scrap before comparison.
//! Refined converts at a fixed 1:18 rate; keys convert at the live rate
//! fetched from the quote service. The banking site publishes prices as
//! free text ("1 key, 13.66 refined"), parsed here.

use crate::types::{HalfScrap, PriceParseError};

/// Half-scrap units in one refined: 9 scrap, 2 half-scrap each.
pub const HALF_SCRAP_PER_REFINED: f64 = 18.0;

/// Convert refined metal to half-scrap.
///
/// Fractional amounts round half away from zero (`f64::round`): 0.33 refined
/// is 6 half-scrap, 13.66 refined is 246. Real metal values land on 1/18
/// steps (.11, .33, .66, ...), so the exact-half case never occurs in
/// practice, but the rule is pinned by test either way.
pub fn refined_to_half_scrap(metal: f64) -> HalfScrap {
    if metal == 0.0 {
        return 0;
    }
    (metal * HALF_SCRAP_PER_REFINED).round() as HalfScrap
}

/// Convert whole keys to half-scrap at the given key rate.
pub fn keys_to_half_scrap(keys: i64, key_price: HalfScrap) -> HalfScrap {
    if keys == 0 {
        return 0;
    }
    keys * key_price
}

/// Parse a banking-page price string into half-scrap.
///
/// Accepted shapes: `"<keys> key[s], <refined> refined"` with the refined
/// clause optional, or `"<refined> refined"` alone. Tokenization is a plain
/// whitespace split; the substring `key` in the second token selects the
/// key-count branch.
pub fn parse_listed_price(
    text: &str,
    key_price: HalfScrap,
) -> Result<HalfScrap, PriceParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (first, second) = match (tokens.first(), tokens.get(1)) {
        (Some(first), Some(second)) => (*first, *second),
        (Some(_), None) => {
            return Err(PriceParseError::MissingUnit(text.trim().to_string()));
        }
        (None, _) => return Err(PriceParseError::Empty),
    };

    let (keys, refined) = if second.contains("key") {
        let keys: i64 = first
            .parse()
            .map_err(|_| PriceParseError::BadKeyCount(first.to_string()))?;
        let refined = match tokens.get(2) {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| PriceParseError::BadRefined((*raw).to_string()))?,
            None => 0.0,
        };
        (keys, refined)
    } else {
        let refined: f64 = first
            .parse()
            .map_err(|_| PriceParseError::BadRefined(first.to_string()))?;
        (0, refined)
    };

    Ok(keys_to_half_scrap(keys, key_price) + refined_to_half_scrap(refined))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
