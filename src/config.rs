//! Configuration from environment variables.
//!
//! All settings come from the process environment (a `.env` file is
//! loaded first when present). The backpack.tf credentials and the
//! catalog refresh interval are required; alert creation is opt-in.

use anyhow::{Context, Result};
use std::time::Duration;

/// Values accepted as "on" for boolean flags, after trimming and
/// lowercasing. Anything else, including an unset variable, is off.
const TRUTHY: &[&str] = &["true", "1"];

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// backpack.tf OAuth client id.
    pub backpack_client_id: String,
    /// backpack.tf OAuth client secret.
    pub backpack_client_secret: String,
    /// How often the key price and catalog are refreshed.
    pub update_interval: Duration,
    /// Whether to create backpack.tf alerts for every banked item at startup.
    pub create_alerts: bool,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            backpack_client_id: require_env("BACKPACK_CLIENT_ID")?,
            backpack_client_secret: require_env("BACKPACK_CLIENT_SECRET")?,
            update_interval: parse_interval(&require_env("UPDATE_INTERVAL")?)?,
            create_alerts: parse_flag(std::env::var("CREATE_ALERTS").ok().as_deref()),
        })
    }
}

/// Resolve a required environment variable.
fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("Environment variable not set: {name}"))
}

/// Parse the refresh interval from whole seconds.
fn parse_interval(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("UPDATE_INTERVAL is not a whole number of seconds: {raw:?}"))?;
    Ok(Duration::from_secs(secs))
}

/// Interpret an optional flag value. Unset means off.
fn parse_flag(raw: Option<&str>) -> bool {
    match raw {
        Some(value) => TRUTHY.contains(&value.trim().to_lowercase().as_str()),
        None => false,
    }
}
