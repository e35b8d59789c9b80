use std::{collections::HashMap, fs, path::Path};

use client_core::{
    SelectAllPolicy, DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_SELECTION_KEY,
    UNIVERSE_PAGE_SIZE,
};
use tracing::warn;

pub const CONFIG_FILE: &str = "artsel.toml";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/artsel.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub database_url: String,
    pub page_size: u32,
    pub universe_page_size: u32,
    pub selection_key: String,
    pub select_all_policy: SelectAllPolicy,
    pub http_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            universe_page_size: UNIVERSE_PAGE_SIZE,
            selection_key: DEFAULT_SELECTION_KEY.into(),
            select_all_policy: SelectAllPolicy::Snapshot,
            http_timeout_seconds: 30,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the flat TOML file, then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    let value = match value {
                        toml::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    apply(&mut settings, &key, &value);
                }
            }
            Err(error) => warn!(path = %path.display(), %error, "config: ignoring unreadable file"),
        }
    }

    let overrides = [
        ("ARTSEL_API_URL", "api_url"),
        ("APP__API_URL", "api_url"),
        ("DATABASE_URL", "database_url"),
        ("APP__DATABASE_URL", "database_url"),
        ("APP__PAGE_SIZE", "page_size"),
        ("APP__UNIVERSE_PAGE_SIZE", "universe_page_size"),
        ("APP__SELECTION_KEY", "selection_key"),
        ("APP__SELECT_ALL_POLICY", "select_all_policy"),
        ("APP__HTTP_TIMEOUT_SECONDS", "http_timeout_seconds"),
    ];
    for (var, key) in overrides {
        if let Some(value) = env(var) {
            apply(&mut settings, key, &value);
        }
    }

    settings
}

fn apply(settings: &mut Settings, key: &str, value: &str) {
    match key {
        "api_url" | "api_base_url" => settings.api_base_url = value.to_string(),
        "database_url" => settings.database_url = value.to_string(),
        "selection_key" => settings.selection_key = value.to_string(),
        "page_size" => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => settings.page_size = parsed,
            _ => warn!(key, value, "config: ignoring invalid page size"),
        },
        "universe_page_size" => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => settings.universe_page_size = parsed,
            _ => warn!(key, value, "config: ignoring invalid page size"),
        },
        "select_all_policy" => match value.parse::<SelectAllPolicy>() {
            Ok(policy) => settings.select_all_policy = policy,
            Err(error) => warn!(key, %error, "config: ignoring invalid policy"),
        },
        "http_timeout_seconds" => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => settings.http_timeout_seconds = parsed,
            _ => warn!(key, value, "config: ignoring invalid timeout"),
        },
        _ => warn!(key, "config: ignoring unknown key"),
    }
}
