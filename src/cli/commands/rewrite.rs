//! Rewrite command.

use anyhow::Result;

use crate::config::StickySettings;
use crate::sticky;

/// Print the sticky search URL, or a note when the query is blank.
pub fn run_rewrite(settings: &StickySettings, url: &str, query: &str, chip: bool) -> Result<()> {
    match sticky::rewrite_search_url(url, query, chip, &settings.preserved_params)? {
        Some(href) => println!("{href}"),
        None => eprintln!("Empty query, no navigation"),
    }
    Ok(())
}
