//! Config loader — reads `<config_root>/config.json`, applies legacy
//! migrations and environment overrides.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `<config_root>/config.json`
//! 3. Environment variables `CLAWLESS_<SECTION>__<FIELD>` (override JSON)
//!
//! The config root is `$CLAWLESS_CONFIG_ROOT`, falling back to `~/.clawless`.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::schema::Config;
use crate::utils::get_config_root;

/// File name inside the config root.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Config file path for a given (or the default) config root.
pub fn get_config_path(config_root: Option<&Path>) -> PathBuf {
    config_root
        .map(PathBuf::from)
        .unwrap_or_else(get_config_root)
        .join(CONFIG_FILE_NAME)
}

/// Load configuration from the config root + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
/// `paths.configRoot` always ends up pointing at the directory that was read,
/// and every root is made absolute.
pub fn load_config(config_root: Option<&Path>) -> Config {
    let root = config_root.map(PathBuf::from).unwrap_or_else(get_config_root);
    let mut config = load_config_from_path(&root.join(CONFIG_FILE_NAME));
    config.paths.config_root = root.to_string_lossy().to_string();
    config.paths.coerce();
    config
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, config_root: Option<&Path>) -> std::io::Result<()> {
    let config_path = get_config_path(config_root);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Older installs wrote snake_case keys (`connection_string`, `mcp_servers`,
/// `owner_user_id`, ...). Each such key is renamed to camelCase unless the
/// camelCase key is already present.
fn migrate_config(raw: &mut Value) {
    match raw {
        Value::Object(map) => {
            let legacy: Vec<String> = map.keys().filter(|k| k.contains('_')).cloned().collect();
            for key in legacy {
                let camel = snake_to_camel(&key);
                if camel == key || map.contains_key(&camel) {
                    continue;
                }
                if let Some(val) = map.remove(&key) {
                    debug!("Migrated config key {} → {}", key, camel);
                    map.insert(camel, val);
                }
            }
            for val in map.values_mut() {
                migrate_config(val);
            }
        }
        Value::Array(items) => {
            for item in items {
                migrate_config(item);
            }
        }
        _ => {}
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for (i, c) in key.chars().enumerate() {
        if c == '_' && i > 0 {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `CLAWLESS_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `CLAWLESS_LLM__CONNECTION_STRING` → `llm.connection_string`
/// - `CLAWLESS_LLM__API_KEY` → `llm.api_key`
/// - `CLAWLESS_LLM__API_BASE` → `llm.api_base`
/// - `CLAWLESS_PATHS__INTERNAL_ROOT` → `paths.internal_root`
/// - `CLAWLESS_PATHS__SHARED_ROOT` → `paths.shared_root`
/// - `CLAWLESS_HEARTBEAT__ENABLED` → `heartbeat.enabled`
/// - `CLAWLESS_HEARTBEAT__INTERVAL_MINUTES` → `heartbeat.interval_minutes`
/// - `CLAWLESS_HEARTBEAT__ACTIVE_HOURS` → `heartbeat.active_hours`
/// - `CLAWLESS_AGENT__HISTORY_LIMIT` → `agent.history_limit`
fn apply_env_overrides(mut config: Config) -> Config {
    // LLM
    if let Ok(val) = std::env::var("CLAWLESS_LLM__CONNECTION_STRING") {
        config.llm.connection_string = val;
    }
    if let Ok(val) = std::env::var("CLAWLESS_LLM__API_KEY") {
        config.llm.api_key = val;
    }
    if let Ok(val) = std::env::var("CLAWLESS_LLM__API_BASE") {
        config.llm.api_base = Some(val);
    }

    // Paths
    if let Ok(val) = std::env::var("CLAWLESS_PATHS__INTERNAL_ROOT") {
        config.paths.internal_root = val;
    }
    if let Ok(val) = std::env::var("CLAWLESS_PATHS__SHARED_ROOT") {
        config.paths.shared_root = val;
    }

    // Heartbeat
    if let Ok(val) = std::env::var("CLAWLESS_HEARTBEAT__ENABLED") {
        config.heartbeat.enabled = val == "true" || val == "1";
    }
    if let Ok(val) = std::env::var("CLAWLESS_HEARTBEAT__INTERVAL_MINUTES") {
        if let Ok(n) = val.parse::<u64>() {
            config.heartbeat.interval_minutes = n;
        }
    }
    if let Ok(val) = std::env::var("CLAWLESS_HEARTBEAT__ACTIVE_HOURS") {
        config.heartbeat.active_hours = if val.is_empty() { None } else { Some(val) };
    }

    // Agent
    if let Ok(val) = std::env::var("CLAWLESS_AGENT__HISTORY_LIMIT") {
        if let Ok(n) = val.parse::<usize>() {
            config.agent.history_limit = n;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
