use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use gateway::HttpGatewayConfig;
use storage::normalize_database_url;

pub const DEFAULT_CONFIG_FILE: &str = "alterevo.toml";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_CAPTION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub image_model: String,
    pub caption_model: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            api_key: None,
            image_model: DEFAULT_IMAGE_MODEL.into(),
            caption_model: DEFAULT_CAPTION_MODEL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn gateway_config(&self) -> anyhow::Result<HttpGatewayConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .context("no API key configured; set GEMINI_API_KEY or api_key in alterevo.toml")?;
        Ok(HttpGatewayConfig {
            base_url: self.api_base_url.clone(),
            api_key,
            image_model: self.image_model.clone(),
            caption_model: self.caption_model.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

/// Defaults, then the config file (explicit path or `alterevo.toml` in the
/// working directory), then environment variables.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file_overrides(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                if let Err(err) = apply_file_overrides(&mut settings, &raw) {
                    tracing::warn!("ignoring unreadable {DEFAULT_CONFIG_FILE}: {err:#}");
                }
            }
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)
        .context("config file is not valid TOML")?;

    let text = |key: &str| -> Option<String> {
        match file_cfg.get(key)? {
            toml::Value::String(v) => Some(v.clone()),
            other => Some(other.to_string()),
        }
    };

    if let Some(v) = text("database_url") {
        settings.database_url = normalize_database_url(&v);
    }
    if let Some(v) = text("api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = text("api_key") {
        settings.api_key = Some(v);
    }
    if let Some(v) = text("image_model") {
        settings.image_model = v;
    }
    if let Some(v) = text("caption_model") {
        settings.caption_model = v;
    }
    if let Some(v) = text("request_timeout_secs") {
        settings.request_timeout_secs = v
            .parse()
            .with_context(|| format!("request_timeout_secs must be a whole number, got '{v}'"))?;
    }

    Ok(())
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ALTEREVO_DATABASE_URL") {
        settings.database_url = normalize_database_url(&v);
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = normalize_database_url(&v);
    }

    if let Some(v) = lookup("ALTEREVO_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("GEMINI_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = lookup("APP__API_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = lookup("APP__IMAGE_MODEL") {
        settings.image_model = v;
    }
    if let Some(v) = lookup("APP__CAPTION_MODEL") {
        settings.caption_model = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn default_database_url() -> String {
    let path = dirs::data_dir()
        .map(|dir| dir.join("alterevo").join("history.db"))
        .unwrap_or_else(|| Path::new("./data").join("history.db"));
    normalize_database_url(&path.to_string_lossy())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
