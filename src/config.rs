//! Configuration module for domwatch.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.domwatch/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOMWATCH_` and use double
//! underscores to separate nested levels:
//! - `DOMWATCH_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `DOMWATCH_WATCH__SUPPORT_SHADOW_DOM=false` sets `watch.support_shadow_dom`
//! - `DOMWATCH_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".domwatch";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DOMWATCH_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Defaults applied to every watch built with these settings
    #[serde(default)]
    pub watch: WatchSettings,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Search URL rewriting
    #[serde(default)]
    pub sticky: StickySettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchSettings {
    /// Quiet period after the last mutation batch before re-querying
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Descend into open shadow roots
    #[serde(default = "default_true")]
    pub support_shadow_dom: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for everything without a module override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `domwatch::watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StickySettings {
    /// Query parameters carried over to the search URL
    #[serde(default = "default_preserved_params")]
    pub preserved_params: Vec<String>,

    /// The search box to intercept
    #[serde(default = "default_search_input_selector")]
    pub search_input_selector: String,

    /// Scope chip shown while searching inside a community
    #[serde(default = "default_scope_chip_selector")]
    pub scope_chip_selector: String,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_debounce_ms() -> u64 { 100 }
fn default_log_level() -> String { "warn".to_string() }
fn default_preserved_params() -> Vec<String> {
    ["sort", "t", "type"].iter().map(|p| p.to_string()).collect()
}
fn default_search_input_selector() -> String {
    r#".input-container > input[name="q"]"#.to_string()
}
fn default_scope_chip_selector() -> String {
    "faceplate-search-input #search-input-chip".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch: WatchSettings::default(),
            logging: LoggingConfig::default(),
            sticky: StickySettings::default(),
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            support_shadow_dom: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for StickySettings {
    fn default() -> Self {
        Self {
            preserved_params: default_preserved_params(),
            search_input_selector: default_search_input_selector(),
            scope_chip_selector: default_scope_chip_selector(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.domwatch/settings.toml` in the current directory or an ancestor
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file below `dir`
    pub fn init_config_file_in(
        dir: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        let existed = config_path.exists();

        if !force && existed {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        if existed {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.watch.debounce_ms, 100);
        assert!(settings.watch.support_shadow_dom);
        assert_eq!(settings.logging.default, "warn");
        assert_eq!(settings.sticky.preserved_params, vec!["sort", "t", "type"]);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[watch]
debounce_ms = 40
support_shadow_dom = false

[logging]
default = "info"

[logging.modules]
"domwatch::watcher" = "debug"

[sticky]
preserved_params = ["sort"]
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.watch.debounce_ms, 40);
        assert!(!settings.watch.support_shadow_dom);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(settings.logging.modules["domwatch::watcher"], "debug");
        // Custom list replaces the default one
        assert_eq!(settings.sticky.preserved_params, vec!["sort"]);
        // Untouched keys keep their defaults
        assert_eq!(
            settings.sticky.scope_chip_selector,
            "faceplate-search-input #search-input-chip"
        );
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.watch.debounce_ms = 5;
        settings.logging.modules.insert("domwatch".to_string(), "trace".to_string());

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_init_config_file_respects_force() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file_in(temp_dir.path(), false).unwrap();
        assert!(path.exists());
        assert!(Settings::init_config_file_in(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file_in(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.watch, WatchSettings::default());
    }
}
