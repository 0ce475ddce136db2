//! prices.tf quote client.
//!
//! Serves exactly one number: the current sell price of a key in
//! half-scrap. Auth is a bearer token handed out without credentials;
//! the token is fetched lazily on first use and re-fetched once per call
//! when the API rejects it.
//!
//! API: `https://api2.prices.tf`
//! Auth: POST `/auth/access` → `accessToken`, sent as a Bearer header.
//! Quote: GET `/prices/<sku>` → `sellHalfScrap`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::QuoteService;
use crate::types::{ApiError, HalfScrap};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api2.prices.tf";
const USER_AGENT: &str = "scrapyard/0.1.0 (tf2-arbitrage)";

/// SKU of the Mann Co. Supply Crate Key (defindex 5021, unique quality).
const KEY_SKU: &str = "5021;6";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessResponse {
    access_token: String,
}

/// Price record for one SKU. Only the sell side is used; the field is
/// optional because the API omits it for never-traded items.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPriceResponse {
    #[serde(default)]
    sell_half_scrap: Option<HalfScrap>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// prices.tf client. Owns its bearer token explicitly; no token is held
/// until the first quote call needs one.
pub struct PricesClient {
    http: Client,
    token: Option<String>,
}

impl PricesClient {
    /// Create a new quote client. No I/O happens here.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for prices.tf")?;

        Ok(Self { http, token: None })
    }

    // -- Internal helpers ------------------------------------------------

    /// Fetch a fresh access token and store it.
    async fn fetch_token(&mut self) -> Result<String, ApiError> {
        debug!("Fetching prices.tf access token");

        let resp = self
            .http
            .post(format!("{BASE_URL}/auth/access"))
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        let access: AccessResponse = resp.json().await.map_err(ApiError::Connection)?;
        self.token = Some(access.access_token.clone());
        Ok(access.access_token)
    }

    /// Current token, fetching one first if none is held yet.
    async fn ensure_token(&mut self) -> Result<String, ApiError> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.fetch_token().await,
        }
    }

    /// One GET of the key quote with the given token.
    async fn request_key_price(&self, token: &str) -> Result<Option<HalfScrap>, ApiError> {
        let url = format!("{BASE_URL}/prices/{}", urlencoding::encode(KEY_SKU));

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthExpired);
        }
        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        let price: KeyPriceResponse = resp.json().await.map_err(ApiError::Connection)?;
        Ok(price.sell_half_scrap)
    }
}

// ---------------------------------------------------------------------------
// QuoteService trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl QuoteService for PricesClient {
    /// One quote attempt: ensure a token, then a single refresh-and-retry
    /// when the API answers 401. Every failure degrades to `None`.
    async fn key_sell_price(&mut self) -> Option<HalfScrap> {
        let token = match self.ensure_token().await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Could not fetch prices.tf token");
                return None;
            }
        };

        let result = match self.request_key_price(&token).await {
            Err(ApiError::AuthExpired) => {
                debug!("Quote token rejected, refreshing");
                match self.fetch_token().await {
                    Ok(fresh) => self.request_key_price(&fresh).await,
                    Err(e) => Err(e),
                }
            }
            other => other,
        };

        match result {
            Ok(price) => price,
            Err(e) => {
                error!(error = %e, "Could not get key sell price");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
