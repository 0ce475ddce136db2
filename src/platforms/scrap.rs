//! scrap.tf page fetcher.
//!
//! scrap.tf has no API for its item-banking table; the catalog comes from
//! scraping the `/items` page. This module only fetches the raw HTML;
//! parsing lives in [`crate::catalog`].

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::types::ApiError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const ITEMS_URL: &str = "https://scrap.tf/items";

/// The site serves the full banking table only to browser user agents;
/// a bot-looking UA gets a stripped page.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:47.0) Gecko/20100101 Firefox/47.0";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// scrap.tf HTTP client. No auth, no state beyond the connection pool.
pub struct ScrapClient {
    http: Client,
}

impl ScrapClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to build HTTP client for scrap.tf")?;

        Ok(Self { http })
    }

    /// Fetch the item-banking page as raw HTML.
    pub async fn fetch_items_page(&self) -> Result<String, ApiError> {
        debug!(url = ITEMS_URL, "Fetching scrap.tf banking page");

        let resp = self
            .http
            .get(ITEMS_URL)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        resp.text().await.map_err(ApiError::Connection)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
