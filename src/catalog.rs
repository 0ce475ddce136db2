//! Banking catalog built from the scraped item listing page.
//!
//! The banking site has no API; its stock is published as an HTML table.
//! Rows are lifted out with CSS selectors, the free-text prices go through
//! the currency parser, and scraped names are joined to canonical
//! marketplace names via the alias table. The result is rebuilt wholesale
//! on every refresh; entries are never patched in place.

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::aliases::AliasTable;
use crate::currency;
use crate::types::{Catalog, CatalogEntry, HalfScrap};

/// Rows of the item-banking table.
const ROW_SELECTOR: &str = "#itembanking-list > tbody > tr";

/// The two stock-limit numbers nested inside the limits cell.
const LIMIT_SELECTOR: &str = "div > div > div";

/// One row lifted out of the banking table, prices still free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedListing {
    pub name: String,
    pub buy_text: String,
    pub sell_text: String,
    pub limit_bottom: u32,
    pub limit_up: u32,
}

// ---------------------------------------------------------------------------
// Row extraction
// ---------------------------------------------------------------------------

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid CSS selector {css:?}: {e}"))
}

/// First non-whitespace text in an element, trimmed.
fn first_text(el: ElementRef) -> Option<String> {
    el.text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// All text inside an element, concatenated and trimmed.
fn full_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extract the banking rows from the page HTML.
///
/// A row that does not match the expected cell layout is skipped with a
/// warning, so a partial page redesign degrades the catalog instead of
/// aborting the refresh.
pub fn extract_listings(html: &str) -> Result<Vec<ScrapedListing>> {
    let row_sel = selector(ROW_SELECTOR)?;
    let cell_sel = selector("td")?;
    let limit_sel = selector(LIMIT_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for (index, row) in document.select(&row_sel).enumerate() {
        match extract_row(row, &cell_sel, &limit_sel) {
            Some(listing) => listings.push(listing),
            None => warn!(row = index, "Skipping malformed banking row"),
        }
    }

    Ok(listings)
}

/// Pull one listing out of a table row.
///
/// Cell order on the page: icon, item name, buy price, sell price, stock
/// limits. Price text is the first non-empty string in its cell; the two
/// limit numbers sit in nested divs.
fn extract_row(
    row: ElementRef,
    cell_sel: &Selector,
    limit_sel: &Selector,
) -> Option<ScrapedListing> {
    let cells: Vec<ElementRef> = row.select(cell_sel).collect();
    if cells.len() < 5 {
        return None;
    }

    let name = full_text(cells[1]);
    if name.is_empty() {
        return None;
    }

    let buy_text = first_text(cells[2])?;
    let sell_text = first_text(cells[3])?;

    let mut limits = cells[4].select(limit_sel);
    let limit_bottom = full_text(limits.next()?).parse().ok()?;
    let limit_up = full_text(limits.next()?).parse().ok()?;

    Some(ScrapedListing {
        name,
        buy_text,
        sell_text,
        limit_bottom,
        limit_up,
    })
}

// ---------------------------------------------------------------------------
// Catalog build
// ---------------------------------------------------------------------------

/// Build the canonical-name catalog from scraped rows.
///
/// Prices are parsed to half-scrap at the given key rate and each scraped
/// name fans out to its canonical aliases. Names without an alias entry are
/// skipped; the marketplace cannot notify on them. When several rows share
/// a canonical alias, the last row wins.
pub fn build_catalog(
    listings: &[ScrapedListing],
    aliases: &AliasTable,
    key_price: HalfScrap,
) -> Catalog {
    let mut catalog = Catalog::new();

    for listing in listings {
        let canonical = match aliases.get(&listing.name) {
            Some(names) if !names.is_empty() => names,
            _ => {
                debug!(name = %listing.name, "No alias entry, row skipped");
                continue;
            }
        };

        let price_to_buy = match currency::parse_listed_price(&listing.buy_text, key_price) {
            Ok(price) => price,
            Err(e) => {
                warn!(name = %listing.name, error = %e, "Unparseable buy price, row skipped");
                continue;
            }
        };
        let price_to_sell = match currency::parse_listed_price(&listing.sell_text, key_price) {
            Ok(price) => price,
            Err(e) => {
                warn!(name = %listing.name, error = %e, "Unparseable sell price, row skipped");
                continue;
            }
        };

        for name in canonical {
            catalog.insert(
                name.clone(),
                CatalogEntry {
                    price_to_buy,
                    price_to_sell,
                    limit_bottom: listing.limit_bottom,
                    limit_up: listing.limit_up,
                },
            );
        }
    }

    catalog
}

/// Extract rows and build the catalog in one step.
pub fn catalog_from_page(
    html: &str,
    aliases: &AliasTable,
    key_price: HalfScrap,
) -> Result<Catalog> {
    let listings = extract_listings(html)?;
    let catalog = build_catalog(&listings, aliases, key_price);
    info!(
        rows = listings.len(),
        entries = catalog.len(),
        key_price,
        "Catalog rebuilt"
    );
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Fixtures --

    fn banking_page(rows: &str) -> String {
        format!(
            "<html><body>\
             <table id=\"itembanking-list\">\
             <thead><tr><th>Item</th><th>We pay</th></tr></thead>\
             <tbody>{rows}</tbody></table>\
             </body></html>"
        )
    }

    fn banking_row(name: &str, buy: &str, sell: &str, bottom: u32, up: u32) -> String {
        format!(
            "<tr>\
             <td><img src=\"/icon.png\"></td>\
             <td> {name} </td>\
             <td><div class=\"price\"> {buy} </div></td>\
             <td><div class=\"price\"> {sell} </div></td>\
             <td><div class=\"limit\"><div>\
             <div>{bottom}</div><div>{up}</div><div class=\"bar\"></div>\
             </div></div></td>\
             </tr>"
        )
    }

    fn alias_table(pairs: &[(&str, &[&str])]) -> AliasTable {
        pairs
            .iter()
            .map(|(scraped, canonical)| {
                (
                    scraped.to_string(),
                    canonical.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect()
    }

    // -- Extraction tests --

    #[test]
    fn test_extract_listings_basic() {
        let page = banking_page(&format!(
            "{}{}",
            banking_row("Tough Break Key", "1 key, 2.33 refined", "1 key, 1.66 refined", 3, 25),
            banking_row("Reclaimed Metal", "0.33 refined", "0.33 refined", 120, 400),
        ));

        let listings = extract_listings(&page).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(
            listings[0],
            ScrapedListing {
                name: "Tough Break Key".to_string(),
                buy_text: "1 key, 2.33 refined".to_string(),
                sell_text: "1 key, 1.66 refined".to_string(),
                limit_bottom: 3,
                limit_up: 25,
            },
        );
        assert_eq!(listings[1].name, "Reclaimed Metal");
        assert_eq!(listings[1].limit_up, 400);
    }

    #[test]
    fn test_extract_skips_malformed_row() {
        let page = banking_page(&format!(
            "<tr><td>stub row</td></tr>{}",
            banking_row("Tough Break Key", "5 refined", "4 refined", 1, 5),
        ));

        let listings = extract_listings(&page).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Tough Break Key");
    }

    #[test]
    fn test_extract_skips_row_with_bad_limits() {
        let row = "<tr>\
                   <td></td><td>Item</td>\
                   <td>5 refined</td><td>4 refined</td>\
                   <td><div><div><div>low</div><div>high</div></div></div></td>\
                   </tr>";
        let listings = extract_listings(&banking_page(row)).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn test_extract_ignores_other_tables() {
        let page = format!(
            "<html><body>\
             <table id=\"other-list\"><tbody>{}</tbody></table>\
             <table id=\"itembanking-list\"><tbody>{}</tbody></table>\
             </body></html>",
            banking_row("Decoy", "1 refined", "1 refined", 0, 1),
            banking_row("Real", "2 refined", "1 refined", 0, 1),
        );

        let listings = extract_listings(&page).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Real");
    }

    #[test]
    fn test_extract_empty_page() {
        let listings = extract_listings("<html><body></body></html>").unwrap();
        assert!(listings.is_empty());
    }

    // -- Build tests --

    fn listing(name: &str, buy: &str, sell: &str, bottom: u32, up: u32) -> ScrapedListing {
        ScrapedListing {
            name: name.to_string(),
            buy_text: buy.to_string(),
            sell_text: sell.to_string(),
            limit_bottom: bottom,
            limit_up: up,
        }
    }

    #[test]
    fn test_build_catalog_basic() {
        let listings = [listing(
            "Tough Break Key",
            "1 key, 13.66 refined",
            "1 key, 12 refined",
            3,
            25,
        )];
        let aliases = alias_table(&[("Tough Break Key", &["Tough Break Key"])]);

        let catalog = build_catalog(&listings, &aliases, 1000);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog["Tough Break Key"],
            CatalogEntry {
                price_to_buy: 1246,
                price_to_sell: 1216,
                limit_bottom: 3,
                limit_up: 25,
            },
        );
    }

    #[test]
    fn test_build_skips_unaliased_row() {
        let listings = [
            listing("Known", "5 refined", "4 refined", 1, 5),
            listing("Unknown", "5 refined", "4 refined", 1, 5),
        ];
        let aliases = alias_table(&[("Known", &["Known"])]);

        let catalog = build_catalog(&listings, &aliases, 1000);
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.contains_key("Unknown"));
    }

    #[test]
    fn test_build_empty_alias_list_skips() {
        let listings = [listing("Orphan", "5 refined", "4 refined", 1, 5)];
        let aliases = alias_table(&[("Orphan", &[])]);

        let catalog = build_catalog(&listings, &aliases, 1000);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_build_fans_out_aliases() {
        let listings = [listing("Tough Break Key", "3 keys", "2 keys", 5, 10)];
        let aliases = alias_table(&[(
            "Tough Break Key",
            &["Tough Break Key", "Non-Craftable Tough Break Key"],
        )]);

        let catalog = build_catalog(&listings, &aliases, 1137);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["Tough Break Key"].price_to_buy, 3411);
        assert_eq!(
            catalog["Tough Break Key"],
            catalog["Non-Craftable Tough Break Key"],
        );
    }

    #[test]
    fn test_build_last_write_wins() {
        let listings = [
            listing("Refined Metal", "1 refined", "0.88 refined", 10, 20),
            listing("Metal (bulk)", "2 refined", "1.88 refined", 30, 40),
        ];
        let aliases = alias_table(&[
            ("Refined Metal", &["Refined Metal"]),
            ("Metal (bulk)", &["Refined Metal"]),
        ]);

        let catalog = build_catalog(&listings, &aliases, 1000);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog["Refined Metal"].price_to_buy, 36);
        assert_eq!(catalog["Refined Metal"].limit_bottom, 30);
    }

    #[test]
    fn test_build_skips_unparseable_price() {
        let listings = [
            listing("Broken", "soon", "4 refined", 1, 5),
            listing("Fine", "5 refined", "4 refined", 1, 5),
        ];
        let aliases = alias_table(&[("Broken", &["Broken"]), ("Fine", &["Fine"])]);

        let catalog = build_catalog(&listings, &aliases, 1000);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains_key("Fine"));
    }

    // -- End to end --

    #[test]
    fn test_catalog_from_page() {
        let page = banking_page(&format!(
            "{}{}",
            banking_row("Tough Break Key", "1 key, 13.66 refined", "1 key, 12 refined", 3, 25),
            banking_row("Nameless", "1 refined", "1 refined", 0, 1),
        ));
        let aliases = alias_table(&[(
            "Tough Break Key",
            &["Tough Break Key", "Non-Craftable Tough Break Key"],
        )]);

        let catalog = catalog_from_page(&page, &aliases, 1000).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["Non-Craftable Tough Break Key"].price_to_sell, 1216);
    }
}
