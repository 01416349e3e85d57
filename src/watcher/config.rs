//! Per-watch configuration.

use std::fmt;
use std::time::Duration;

use crate::config::WatchSettings;
use crate::dom::{Element, Node};
use crate::selector::{SelectorInput, SelectorList};

use super::WatchError;
use super::handler::{ElementHandler, Flow, handler};

/// Debounce used when neither the builder nor settings say otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Immutable configuration of one watch.
#[derive(Clone)]
pub struct WatchConfig {
    pub(crate) selectors: SelectorList,
    pub(crate) on_element: ElementHandler,
    pub(crate) debounce: Duration,
    pub(crate) support_shadow_dom: bool,
    pub(crate) root: Option<Node>,
}

impl WatchConfig {
    /// Start building a watch for `selector` (one selector or an ordered fallback list).
    ///
    /// `on_element` may return `()`, `bool` (`true` stops), [`Flow`] or a
    /// `ControlFlow`.
    pub fn builder<F, R>(selector: impl Into<SelectorInput>, on_element: F) -> WatchConfigBuilder
    where
        F: Fn(&Element) -> R + Send + Sync + 'static,
        R: Into<Flow>,
    {
        WatchConfigBuilder {
            selector: selector.into(),
            on_element: handler(on_element),
            debounce: DEFAULT_DEBOUNCE,
            support_shadow_dom: true,
            root: None,
        }
    }

    pub fn selectors(&self) -> &SelectorList {
        &self.selectors
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn support_shadow_dom(&self) -> bool {
        self.support_shadow_dom
    }

    /// Explicit root; `None` means the document body.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }
}

impl fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchConfig")
            .field("selectors", &self.selectors)
            .field("debounce", &self.debounce)
            .field("support_shadow_dom", &self.support_shadow_dom)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WatchConfig`].
pub struct WatchConfigBuilder {
    selector: SelectorInput,
    on_element: ElementHandler,
    debounce: Duration,
    support_shadow_dom: bool,
    root: Option<Node>,
}

impl WatchConfigBuilder {
    /// Take debounce and shadow defaults from loaded settings.
    pub fn with_settings(mut self, settings: &WatchSettings) -> Self {
        self.debounce = Duration::from_millis(settings.debounce_ms);
        self.support_shadow_dom = settings.support_shadow_dom;
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Set the debounce duration in milliseconds.
    pub fn debounce_ms(self, ms: u64) -> Self {
        self.debounce(Duration::from_millis(ms))
    }

    pub fn support_shadow_dom(mut self, enabled: bool) -> Self {
        self.support_shadow_dom = enabled;
        self
    }

    /// Observe this subtree instead of the document body.
    pub fn root(mut self, root: impl Into<Node>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Parse the selectors and finish the configuration.
    pub fn build(self) -> Result<WatchConfig, WatchError> {
        Ok(WatchConfig {
            selectors: SelectorList::parse(self.selector)?,
            on_element: self.on_element,
            debounce: self.debounce,
            support_shadow_dom: self.support_shadow_dom,
            root: self.root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorError;

    #[test]
    fn test_builder_defaults() {
        let config = WatchConfig::builder(".modal", |_| ()).build().unwrap();
        assert_eq!(config.debounce(), DEFAULT_DEBOUNCE);
        assert!(config.support_shadow_dom());
        assert!(config.root().is_none());
        assert_eq!(config.selectors().len(), 1);
    }

    #[test]
    fn test_builder_with_settings_then_override() {
        let settings = WatchSettings {
            debounce_ms: 250,
            support_shadow_dom: false,
        };
        let config = WatchConfig::builder(["#a", "#b"], |_| true)
            .with_settings(&settings)
            .debounce_ms(20)
            .build()
            .unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(20));
        assert!(!config.support_shadow_dom());
        assert_eq!(config.selectors().len(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_selector() {
        let err = WatchConfig::builder("div >", |_| ()).build().unwrap_err();
        assert!(matches!(
            err,
            WatchError::InvalidSelector(SelectorError::DanglingCombinator { .. })
        ));
    }
}
