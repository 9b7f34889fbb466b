use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub username: String,
    pub password: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000/admin".into(),
            username: "admin".into(),
            password: None,
            request_timeout_secs: None,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("ignoring malformed console config file");
        return;
    };
    let get = |key: &str| {
        file_cfg.get(key).map(|value| match value.as_str() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        })
    };

    if let Some(v) = get("api_base") {
        settings.api_base = v;
    }
    if let Some(v) = get("username") {
        settings.username = v;
    }
    if let Some(v) = get("password") {
        settings.password = Some(v);
    }
    if let Some(v) = get("request_timeout_secs") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
    if let Some(v) = get("log_filter") {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ADMIN_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("ADMIN_USERNAME") {
        settings.username = v;
    }
    if let Some(v) = lookup("APP__USERNAME") {
        settings.username = v;
    }

    if let Some(v) = lookup("ADMIN_PASSWORD") {
        settings.password = Some(v);
    }
    if let Some(v) = lookup("APP__PASSWORD") {
        settings.password = Some(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

pub fn normalize_api_base(raw_api_base: &str) -> anyhow::Result<String> {
    let trimmed = raw_api_base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Settings::default().api_base);
    }

    let url = Url::parse(trimmed).with_context(|| format!("invalid api base '{trimmed}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "api base '{trimmed}' must use http or https, not '{}'",
            url.scheme()
        ));
    }

    Ok(trimmed.to_string())
}
