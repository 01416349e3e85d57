//! Sticky search: keep listing filters when searching.
//!
//! Watches for the site search box and, on submit, rewrites the search URL so
//! that the current `sort`, `t` and `type` parameters survive and the search
//! stays scoped to the current community when its scope chip is shown.

mod error;

use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;

pub use error::StickyError;

use crate::config::{StickySettings, WatchSettings};
use crate::dom::{Document, Element};
use crate::query::{self, ShadowMode};
use crate::selector::SelectorList;
use crate::watcher::{self, Cleanup, WatchConfig};

/// The page the search box lives on.
pub trait PageHost: Send + Sync {
    /// Current location: an absolute URL or a path with optional query.
    fn location(&self) -> String;

    /// Navigate to `href`.
    fn navigate(&self, href: &str);
}

/// Builds search URLs that keep the preserved parameters of the current page.
#[derive(Debug, Clone)]
pub struct SearchRewriter {
    location: Regex,
    community: Regex,
    preserved: Vec<String>,
}

impl SearchRewriter {
    pub fn new(preserved: &[String]) -> Result<Self, StickyError> {
        Ok(Self {
            location: Regex::new(
                r"^(?:[A-Za-z][A-Za-z0-9+.-]*://[^/?#]*)?(?P<path>[^?#]*)(?:\?(?P<query>[^#]*))?",
            )?,
            community: Regex::new(r"^/r/([^/]+)")?,
            preserved: preserved.to_vec(),
        })
    }

    /// Search URL for `query` issued from `location`.
    ///
    /// Returns `None` for a blank query. `in_scope` says whether the community
    /// scope chip is present; it only matters on `/r/<name>` pages.
    pub fn rewrite(
        &self,
        location: &str,
        query: &str,
        in_scope: bool,
    ) -> Result<Option<String>, StickyError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let (path, search) = match self.location.captures(location) {
            Some(caps) => (
                caps.name("path").map_or("", |m| m.as_str()),
                caps.name("query").map_or("", |m| m.as_str()),
            ),
            None => ("", ""),
        };

        let base = match self.community.captures(path) {
            Some(caps) if in_scope => format!("/r/{}/search", &caps[1]),
            _ => "/search".to_string(),
        };

        let mut params: Vec<(String, String)> = serde_urlencoded::from_str(search)?;
        params.retain(|(key, _)| self.preserved.iter().any(|keep| keep == key));
        set_param(&mut params, "q", query);

        Ok(Some(format!("{base}?{}", serde_urlencoded::to_string(&params)?)))
    }
}

/// Replace the first `key` pair and drop the rest, or append when absent.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter().position(|(k, _)| k == key) {
        Some(first) => {
            params[first].1 = value.to_string();
            let mut index = 0;
            params.retain(|(k, _)| {
                let keep = index <= first || k != key;
                index += 1;
                keep
            });
        }
        None => params.push((key.to_string(), value.to_string())),
    }
}

/// One-shot form of [`SearchRewriter::rewrite`].
pub fn rewrite_search_url(
    location: &str,
    query: &str,
    in_scope: bool,
    preserved: &[String],
) -> Result<Option<String>, StickyError> {
    SearchRewriter::new(preserved)?.rewrite(location, query, in_scope)
}

/// An installed sticky-search interceptor.
///
/// The input watch never stops on its own, so a re-rendered search box is
/// picked up again. Use [`cleanup`](Self::cleanup) to tear it down.
pub struct StickySearch {
    doc: Document,
    host: Arc<dyn PageHost>,
    rewriter: SearchRewriter,
    scope_chip: SelectorList,
    input: Arc<Mutex<Option<Element>>>,
    cleanup: Cleanup,
}

impl StickySearch {
    /// Watch for the search input using default watch settings.
    pub fn install(
        doc: &Document,
        host: Arc<dyn PageHost>,
        settings: &StickySettings,
    ) -> Result<Self, StickyError> {
        Self::install_with(doc, host, settings, &WatchSettings::default())
    }

    pub fn install_with(
        doc: &Document,
        host: Arc<dyn PageHost>,
        settings: &StickySettings,
        watch: &WatchSettings,
    ) -> Result<Self, StickyError> {
        let rewriter = SearchRewriter::new(&settings.preserved_params)?;
        let scope_chip = SelectorList::parse(settings.scope_chip_selector.as_str())?;

        let input = Arc::new(Mutex::new(None));
        let latest = Arc::clone(&input);
        let config = WatchConfig::builder(settings.search_input_selector.as_str(), move |element| {
            crate::debug_event!("sticky", "input", "{element:?}");
            *latest.lock() = Some(element.clone());
        })
        .with_settings(watch)
        .build()?;

        let cleanup = watcher::observe(doc, config)?;
        crate::log_event!("sticky", "installed", "{}", settings.search_input_selector);

        Ok(Self {
            doc: doc.clone(),
            host,
            rewriter,
            scope_chip,
            input,
            cleanup,
        })
    }

    /// The most recently reported search input.
    pub fn input(&self) -> Option<Element> {
        self.input.lock().clone()
    }

    /// Handle an Enter press in the search input.
    ///
    /// Reads the input's `value`, navigates the host and returns the target
    /// URL. Nothing happens while no input has been seen or the value is blank.
    pub fn submit(&self) -> Result<Option<String>, StickyError> {
        let Some(input) = self.input() else {
            return Ok(None);
        };
        let value = input.attribute("value").unwrap_or_default();
        let in_scope =
            query::query_first(&self.doc.root(), &self.scope_chip, ShadowMode::Pierce).is_some();

        let href = self
            .rewriter
            .rewrite(&self.host.location(), &value, in_scope)?;
        if let Some(href) = &href {
            crate::log_event!("sticky", "navigate", "{href}");
            self.host.navigate(href);
        }
        Ok(href)
    }

    pub fn cleanup(&self) -> &Cleanup {
        &self.cleanup
    }
}
