//! Shared types for the scrapyard bot.
//!
//! These types form the data model used across all modules: the half-scrap
//! money unit, listing intents, banking-catalog entries, the listing events
//! decoded from notifications, and the domain error kinds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// The canonical money unit: half of one scrap.
///
/// 1 refined = 9 scrap = 18 half-scrap; one key is a variable number of
/// half-scrap, fetched live from the quote service. Prices are non-negative;
/// the signed type exists so profits can go below zero during comparison.
pub type HalfScrap = i64;

/// A banking catalog keyed by canonical (backpack.tf) item name.
pub type Catalog = HashMap<String, CatalogEntry>;

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Direction of a marketplace listing: the lister wants to buy or to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Buy,
    Sell,
}

impl Intent {
    /// Both intents (useful for creating alert pairs).
    pub const ALL: &'static [Intent] = &[Intent::Buy, Intent::Sell];

    /// Wire name as used by the marketplace API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Buy => "buy",
            Intent::Sell => "sell",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempt to parse a string into an Intent (case-insensitive).
impl std::str::FromStr for Intent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Intent::Buy),
            "sell" => Ok(Intent::Sell),
            _ => Err(anyhow::anyhow!("Unknown listing intent: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog entry
// ---------------------------------------------------------------------------

/// One banked item on the scraped site, prices converted to half-scrap.
///
/// `limit_bottom`/`limit_up` mirror the site's stock counter ("3 / 25"):
/// how many the bank currently holds and the most it will hold. The bank's
/// stock bounds decide whether there is room to act on a listing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// What the bank charges when we take one out.
    pub price_to_buy: HalfScrap,
    /// What the bank pays when we hand one in.
    pub price_to_sell: HalfScrap,
    pub limit_bottom: u32,
    pub limit_up: u32,
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buy {} | sell {} | stock {}/{}",
            self.price_to_buy, self.price_to_sell, self.limit_bottom, self.limit_up,
        )
    }
}

impl CatalogEntry {
    /// Whether the bank will accept more of this item (stock below cap).
    pub fn bank_has_room(&self) -> bool {
        self.limit_bottom < self.limit_up
    }

    /// Whether the bank has any of this item left to hand out.
    pub fn bank_has_stock(&self) -> bool {
        self.limit_bottom > 0
    }
}

// ---------------------------------------------------------------------------
// Listing event
// ---------------------------------------------------------------------------

/// One listing surfaced by a notification. Transient: consumed by a single
/// evaluation pass, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEvent {
    /// Canonical item name as the marketplace reports it.
    pub item_name: String,
    pub intent: Intent,
    /// Whole keys asked or offered.
    pub keys: i64,
    /// Refined metal asked or offered (fractional).
    pub metal: f64,
    /// Absolute URL of the listing.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// A positive-profit hit against the catalog, ready to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    pub item_name: String,
    pub intent: Intent,
    /// Margin in half-scrap, always > 0 when reported.
    pub profit: HalfScrap,
    pub url: String,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profit: {} intent: {} name: {} url: {}",
            self.profit, self.intent, self.item_name, self.url,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures surfaced by the marketplace and quote clients.
///
/// None of these are fatal: callers log, fall back to an empty result for
/// the current cycle, and keep polling. `AuthExpired` additionally entitles
/// the caller to one token refresh and a single retry of the same request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authorization expired or rejected")]
    AuthExpired,

    #[error("Connection failure: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
}

impl ApiError {
    /// Build a `Status` error from a response status code.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        }
    }
}

/// A scraped price string that matches neither accepted shape
/// (`"<keys> key[s], <refined> refined"` or `"<refined> refined"`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceParseError {
    #[error("Empty price text")]
    Empty,

    #[error("Price text {0:?} has no unit token")]
    MissingUnit(String),

    #[error("Bad key count in {0:?}")]
    BadKeyCount(String),

    #[error("Bad refined amount in {0:?}")]
    BadRefined(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Intent tests --

    #[test]
    fn test_intent_display() {
        assert_eq!(format!("{}", Intent::Buy), "buy");
        assert_eq!(format!("{}", Intent::Sell), "sell");
    }

    #[test]
    fn test_intent_from_str() {
        assert_eq!("buy".parse::<Intent>().unwrap(), Intent::Buy);
        assert_eq!("sell".parse::<Intent>().unwrap(), Intent::Sell);
        assert_eq!("SELL".parse::<Intent>().unwrap(), Intent::Sell);
        assert!("bank".parse::<Intent>().is_err());
        assert!("".parse::<Intent>().is_err());
    }

    #[test]
    fn test_intent_wire_names() {
        // The notification payload uses lowercase intent strings; the serde
        // names must match or decoding silently diverges from the API.
        assert_eq!(serde_json::to_string(&Intent::Sell).unwrap(), "\"sell\"");
        let parsed: Intent = serde_json::from_str("\"buy\"").unwrap();
        assert_eq!(parsed, Intent::Buy);
    }

    #[test]
    fn test_intent_all() {
        assert_eq!(Intent::ALL.len(), 2);
        assert_eq!(Intent::ALL[0], Intent::Buy);
        assert_eq!(Intent::ALL[1], Intent::Sell);
    }

    // -- CatalogEntry tests --

    fn sample_entry() -> CatalogEntry {
        CatalogEntry {
            price_to_buy: 1518,
            price_to_sell: 1494,
            limit_bottom: 3,
            limit_up: 25,
        }
    }

    #[test]
    fn test_entry_bank_has_room() {
        let entry = sample_entry();
        assert!(entry.bank_has_room());

        let full = CatalogEntry {
            limit_bottom: 25,
            limit_up: 25,
            ..entry
        };
        assert!(!full.bank_has_room());

        // An over-stocked counter also means no room.
        let over = CatalogEntry {
            limit_bottom: 30,
            limit_up: 25,
            ..entry
        };
        assert!(!over.bank_has_room());
    }

    #[test]
    fn test_entry_bank_has_stock() {
        assert!(sample_entry().bank_has_stock());

        let empty = CatalogEntry {
            limit_bottom: 0,
            ..sample_entry()
        };
        assert!(!empty.bank_has_stock());
    }

    #[test]
    fn test_entry_display() {
        let display = format!("{}", sample_entry());
        assert!(display.contains("1518"));
        assert!(display.contains("1494"));
        assert!(display.contains("3/25"));
    }

    // -- Opportunity tests --

    #[test]
    fn test_opportunity_display() {
        let opp = Opportunity {
            item_name: "Tough Break Key".to_string(),
            intent: Intent::Sell,
            profit: 20,
            url: "https://backpack.tf/classifieds/440_12345".to_string(),
        };
        assert_eq!(
            format!("{opp}"),
            "profit: 20 intent: sell name: Tough Break Key \
             url: https://backpack.tf/classifieds/440_12345",
        );
    }

    // -- Error tests --

    #[test]
    fn test_api_error_from_status() {
        let err = ApiError::from_status(reqwest::StatusCode::FORBIDDEN);
        assert_eq!(format!("{err}"), "HTTP 403: Forbidden");
    }

    #[test]
    fn test_api_error_auth_display() {
        let err = ApiError::AuthExpired;
        assert!(format!("{err}").contains("Authorization expired"));
    }

    #[test]
    fn test_price_parse_error_display() {
        let err = PriceParseError::BadRefined("abc".to_string());
        assert_eq!(format!("{err}"), "Bad refined amount in \"abc\"");
        assert_eq!(format!("{}", PriceParseError::Empty), "Empty price text");
    }
}
