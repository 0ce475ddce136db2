//! backpack.tf marketplace client.
//!
//! Two jobs: create classifieds alerts so the marketplace starts notifying
//! us about an item, and drain unread notifications (the fetch marks them
//! read server-side in the same call). Notifications carry deeply nested
//! listing payloads in which any field may be absent; decoding is lenient
//! and a notification that cannot be turned into a listing event is
//! dropped, never an error.
//!
//! API: `https://backpack.tf/api/1.0`
//! Auth: OAuth2 client-credentials grant, bearer token on every call.
//! A 401 entitles the caller to one token refresh and a single retry.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::types::{ApiError, Intent, ListingEvent};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SITE_URL: &str = "https://backpack.tf";
const ACCESS_TOKEN_URL: &str = "https://backpack.tf/oauth/access_token";
const ALERTS_URL: &str = "https://backpack.tf/api/1.0/classifieds/alerts";
const NOTIFICATIONS_URL: &str = "https://backpack.tf/api/1.0/notifications/unread";
const USER_AGENT: &str = "scrapyard/0.1.0 (tf2-arbitrage)";

// ---------------------------------------------------------------------------
// API response types (backpack.tf JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedAlert {
    id: String,
}

/// One unread notification. Every level is optional: the API mixes listing
/// notifications with other kinds, and even listing ones omit fields.
#[derive(Debug, Default, Deserialize)]
struct Notification {
    #[serde(default)]
    contents: Option<NotificationContents>,
    #[serde(default)]
    bundle: Option<NotificationBundle>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationContents {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationBundle {
    #[serde(default)]
    listing: Option<ListingPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingPayload {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    item: Option<ItemPayload>,
    #[serde(default)]
    currencies: Option<CurrencyAmounts>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemPayload {
    #[serde(default)]
    name: Option<String>,
}

/// Currency amounts on a listing. Missing sides default to zero; a
/// keys-only listing simply has no `metal` field.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct CurrencyAmounts {
    #[serde(default)]
    keys: i64,
    #[serde(default)]
    metal: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// backpack.tf API client. Owns its OAuth token explicitly.
pub struct BackpackClient {
    http: Client,
    client_id: String,
    client_secret: String,
    token: String,
}

impl BackpackClient {
    /// Connect to backpack.tf: builds the HTTP client and fetches the
    /// initial OAuth token. Bad credentials fail here, not mid-run.
    pub async fn connect(client_id: String, client_secret: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for backpack.tf")?;

        let mut client = Self {
            http,
            client_id,
            client_secret,
            token: String::new(),
        };

        client
            .fetch_token()
            .await
            .context("Initial backpack.tf authorization failed")?;

        Ok(client)
    }

    // -- Internal helpers ------------------------------------------------

    /// Fetch a fresh OAuth token via the client-credentials grant.
    ///
    /// On failure the previous token stays in place, so an expired-but-
    /// working session is never replaced by nothing.
    async fn fetch_token(&mut self) -> Result<(), ApiError> {
        debug!("Fetching backpack.tf OAuth token");

        let resp = self
            .http
            .post(ACCESS_TOKEN_URL)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        let token: TokenResponse = resp.json().await.map_err(ApiError::Connection)?;
        self.token = token.access_token;
        Ok(())
    }

    /// One alert-creation attempt with the current token.
    async fn try_create_alert(&self, item_name: &str, intent: Intent) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(ALERTS_URL)
            .query(&[
                ("item_name", item_name),
                ("intent", intent.as_str()),
                ("blanket", "1"),
            ])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthExpired);
        }
        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        let created: CreatedAlert = resp.json().await.map_err(ApiError::Connection)?;
        Ok(created.id)
    }

    /// One notification-drain attempt with the current token.
    ///
    /// The POST is the read-marking side effect: whatever comes back is
    /// already consumed server-side.
    async fn try_drain_notifications(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        let resp = self
            .http
            .post(NOTIFICATIONS_URL)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthExpired);
        }
        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status()));
        }

        resp.json().await.map_err(ApiError::Connection)
    }

    /// Convert a decoded notification to a listing event.
    ///
    /// Requires the listing URL, item name, and a recognized intent;
    /// anything short of that yields `None`. Missing currency amounts
    /// default to zero rather than dropping the event.
    fn to_listing_event(notification: Notification) -> Option<ListingEvent> {
        let url = notification.contents?.url?;
        let ListingPayload {
            intent,
            item,
            currencies,
        } = notification.bundle?.listing?;

        let item_name = item?.name?;
        let intent: Intent = intent?.parse().ok()?;
        let currencies = currencies.unwrap_or_default();

        Some(ListingEvent {
            item_name,
            intent,
            keys: currencies.keys,
            metal: currencies.metal,
            url: format!("{SITE_URL}{url}"),
        })
    }

    /// Decode one raw notification value, skipping undecodable ones.
    pub fn decode_notification(value: serde_json::Value) -> Option<ListingEvent> {
        let event = serde_json::from_value::<Notification>(value)
            .ok()
            .and_then(Self::to_listing_event);
        if event.is_none() {
            debug!("Skipping notification without a decodable listing");
        }
        event
    }

    // -- Public API ------------------------------------------------------

    /// Create a blanket alert for an item and intent.
    ///
    /// Success and failure are both terminal here: the outcome is logged
    /// and the bot moves on either way. An expired token is refreshed and
    /// the request retried once.
    pub async fn create_alert(&mut self, item_name: &str, intent: Intent) {
        let mut result = self.try_create_alert(item_name, intent).await;

        if matches!(result, Err(ApiError::AuthExpired)) {
            result = match self.fetch_token().await {
                Ok(()) => self.try_create_alert(item_name, intent).await,
                Err(e) => Err(e),
            };
        }

        match result {
            Ok(id) => info!(item = item_name, intent = %intent, id = %id, "Alert created"),
            Err(e) => {
                error!(item = item_name, intent = %intent, error = %e, "Could not create alert");
            }
        }
    }

    /// Drain unread notifications and surface them as listing events.
    ///
    /// Marks everything fetched as read server-side. An expired token is
    /// refreshed and the fetch retried once; any remaining failure logs
    /// and yields an empty batch so the polling loop keeps going.
    pub async fn unread_notifications(&mut self) -> Vec<ListingEvent> {
        let mut result = self.try_drain_notifications().await;

        if matches!(result, Err(ApiError::AuthExpired)) {
            result = match self.fetch_token().await {
                Ok(()) => self.try_drain_notifications().await,
                Err(e) => Err(e),
            };
        }

        match result {
            Ok(raw) => {
                let total = raw.len();
                let events: Vec<ListingEvent> = raw
                    .into_iter()
                    .filter_map(Self::decode_notification)
                    .collect();
                if total > 0 {
                    debug!(total, events = events.len(), "Notifications drained");
                }
                events
            }
            Err(e) => {
                error!(error = %e, "Could not drain notifications");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
