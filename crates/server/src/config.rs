use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

/// Deployment-specific settings read from `config.toml`. Secrets
/// (`DATABASE_URL`, `JWT_SECRET`) come from the environment instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_title: String,
    pub organisation_name: String,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_zoom: u8,
    pub enable_what3words: bool,
    pub enable_public_reporting: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app_title: "Environmental Enforcement".to_string(),
            organisation_name: "the council".to_string(),
            default_latitude: 52.478,
            default_longitude: -1.898,
            default_zoom: 13,
            enable_what3words: false,
            enable_public_reporting: false,
        }
    }
}

/// Read `config.toml` and cache it in the global `OnceLock`. Safe to
/// call multiple times; only the first call has effect.
///
/// If the file is missing or unparseable everything falls back to
/// defaults, with public reporting off.
pub fn load_config() {
    CONFIG.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("failed to parse {CONFIG_PATH}: {e}; using defaults");
            AppConfig::default()
        }),
        Err(e) => {
            tracing::warn!("{CONFIG_PATH} not found ({e}); using defaults");
            AppConfig::default()
        }
    });
}

/// Install a specific config instead of reading `config.toml`. Used by
/// the integration tests; the first caller wins.
pub fn set_config(config: AppConfig) {
    let _ = CONFIG.set(config);
}

/// Get the loaded config. Returns defaults if `load_config()` hasn't
/// been called yet (safe fallback).
pub fn config() -> AppConfig {
    CONFIG.get().cloned().unwrap_or_default()
}
