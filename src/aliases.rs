//! Item-name alias table.
//!
//! The banking site and the marketplace spell item names differently; a
//! static JSON file maps each scraped name to the canonical marketplace
//! names it stands for (one scraped row can cover several canonical
//! variants). Loaded once at startup; edits require a restart.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::info;

/// Scraped item name → canonical marketplace names.
pub type AliasTable = HashMap<String, Vec<String>>;

/// Default alias file path.
const DEFAULT_ALIAS_FILE: &str = "data/item_names.json";

/// Load the alias table from a JSON file.
pub fn load_aliases(path: Option<&str>) -> Result<AliasTable> {
    let path = path.unwrap_or(DEFAULT_ALIAS_FILE);

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read alias table from {path}"))?;

    let table: AliasTable = serde_json::from_str(&json)
        .context(format!("Failed to parse alias table from {path}"))?;

    info!(
        path,
        scraped_names = table.len(),
        canonical_names = table.values().map(Vec::len).sum::<usize>(),
        "Alias table loaded"
    );

    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
