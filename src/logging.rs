//! Compact timestamped logging with per-module levels.
//!
//! Every line is tagged with the component that emitted it:
//!
//! | Tag | Level | Emitted when |
//! |-----|-------|--------------|
//! | `[watcher] start` | debug | a watcher starts, with selectors, debounce and shadow mode |
//! | `[watcher] batch` | debug | a mutation batch arrives and (re)arms the debounce timer |
//! | `[watcher] check` | debug | the debounce timer fires and the selectors are re-queried |
//! | `[watcher] stopped` | info | a watcher stops, with the reason (handler, cleanup, lifecycle) |
//! | `[watcher]` dropped batch | warn | a batch arrived outside a tokio runtime |
//! | `[observer] queued` | debug | records wait for the next delivery |
//! | `[group] started` / `cleanup` | debug | a group starts or its members are stopped |
//! | `[cleanup] lifecycle` | debug | a bound host token was cancelled |
//! | `[sticky] installed` / `navigate` | info | interception starts, or a search is sent |
//! | `[sticky] input` | debug | a newly rendered search box was found |
//! | `[demo] dropped` | debug | the demo's report channel closed early |
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! "domwatch::watcher" = "debug"  # phase transitions and debounced checks
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug domwatch demo
//! RUST_LOG=domwatch::watcher=debug,domwatch::dom=trace domwatch demo --shadow
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initialize logging with configuration.
///
/// Only the first call takes effect. Watchers log stops at `info` and
/// batches, checks and phase changes at `debug`.
///
/// The `RUST_LOG` environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        // RUST_LOG env var takes precedence over config
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(build_filter(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true) // Show target for filtering visibility
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Filter directives for `config`: the default level, then module overrides sorted by target.
fn build_filter(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut filter = config.default.clone();
    for (module, level) in modules {
        filter.push_str(&format!(",{module}={level}"));
    }
    filter
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("watcher", "stopped", "{} ({reason})", selectors);
/// log_event!("sticky", "installed");
/// ```
#[macro_export]
macro_rules! log_event {
    ($handler:expr, $event:expr) => {
        tracing::info!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("observer", "queued", "{} record(s) waiting", pending);
/// ```
#[macro_export]
macro_rules! debug_event {
    ($handler:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_orders_module_overrides() {
        let mut config = LoggingConfig::default();
        config.default = "warn".to_string();
        config
            .modules
            .insert("domwatch::watcher".to_string(), "debug".to_string());
        config
            .modules
            .insert("domwatch::dom".to_string(), "trace".to_string());

        assert_eq!(
            build_filter(&config),
            "warn,domwatch::dom=trace,domwatch::watcher=debug"
        );
    }

    #[test]
    fn test_build_filter_without_overrides() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter(&config), config.default);
    }
}
