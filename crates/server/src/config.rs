use std::{collections::HashMap, fs, path::PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub page_size: usize,
    pub seed_entries: usize,
    pub catalog_file: Option<PathBuf>,
    pub api_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            page_size: 20,
            seed_entries: 200,
            catalog_file: None,
            api_token: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            apply_file_settings(&mut settings, &file_cfg);
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("page_size").and_then(toml::Value::as_integer) {
        if v > 0 {
            settings.page_size = v as usize;
        }
    }
    if let Some(v) = file_cfg.get("seed_entries").and_then(toml::Value::as_integer) {
        if v >= 0 {
            settings.seed_entries = v as usize;
        }
    }
    if let Some(v) = file_cfg.get("catalog_file").and_then(toml::Value::as_str) {
        settings.catalog_file = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg.get("api_token").and_then(toml::Value::as_str) {
        settings.api_token = Some(v.to_string());
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(parsed) = lookup("APP__PAGE_SIZE").and_then(|v| v.parse::<usize>().ok()) {
        if parsed > 0 {
            settings.page_size = parsed;
        }
    }
    if let Some(parsed) = lookup("APP__SEED_ENTRIES").and_then(|v| v.parse::<usize>().ok()) {
        settings.seed_entries = parsed;
    }

    if let Some(v) = lookup("CATALOG_FILE") {
        settings.catalog_file = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("APP__CATALOG_FILE") {
        settings.catalog_file = Some(PathBuf::from(v));
    }

    if let Some(v) = lookup("APP__API_TOKEN") {
        settings.api_token = Some(v).filter(|token| !token.trim().is_empty());
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
