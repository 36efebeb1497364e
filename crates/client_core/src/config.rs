use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::protocol::CATALOG_ROUTE;

pub const DEFAULT_SETTINGS_FILE: &str = "catalog.toml";
pub const DEFAULT_MAX_EMPTY_PAGES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub catalog_path: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub max_empty_pages: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            catalog_path: CATALOG_ROUTE.into(),
            api_token: None,
            request_timeout_secs: 15,
            max_empty_pages: DEFAULT_MAX_EMPTY_PAGES,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    catalog_path: Option<String>,
    api_token: Option<String>,
    request_timeout_secs: Option<u64>,
    max_empty_pages: Option<u32>,
}

/// Defaults, then `catalog.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read client settings '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid client settings '{}'", path.display()))?;
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.catalog_path {
        settings.catalog_path = v;
    }
    if let Some(v) = file_cfg.api_token {
        settings.api_token = Some(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.max_empty_pages {
        settings.max_empty_pages = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(*key));

    if let Some(v) = first(&["APP__CATALOG_URL", "CATALOG_URL"]) {
        settings.base_url = v;
    }
    if let Some(v) = first(&["APP__CATALOG_PATH", "CATALOG_PATH"]) {
        settings.catalog_path = v;
    }
    if let Some(v) = first(&["APP__CATALOG_API_TOKEN", "CATALOG_API_TOKEN"]) {
        settings.api_token = Some(v).filter(|token| !token.trim().is_empty());
    }
    if let Some(parsed) =
        first(&["APP__CATALOG_TIMEOUT_SECS", "CATALOG_TIMEOUT_SECS"]).and_then(|v| v.parse().ok())
    {
        settings.request_timeout_secs = parsed;
    }
    if let Some(parsed) = first(&["APP__CATALOG_MAX_EMPTY_PAGES", "CATALOG_MAX_EMPTY_PAGES"])
        .and_then(|v| v.parse().ok())
    {
        settings.max_empty_pages = parsed;
    }
}
