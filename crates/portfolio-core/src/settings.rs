use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AiSettings {
    /// Overlay values from `PORTFOLIO_AI_PROVIDER`, `PORTFOLIO_AI_MODEL`,
    /// `PORTFOLIO_API_KEY` and `OPENAI_API_KEY` (in that order of precedence
    /// for the key). `lookup` is `std::env::var` in production.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(provider) = non_empty("PORTFOLIO_AI_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = non_empty("PORTFOLIO_AI_MODEL") {
            self.model = model;
        }
        if let Some(key) = non_empty("PORTFOLIO_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.api_key = key;
        }
        if self.provider.is_empty() {
            self.provider = DEFAULT_PROVIDER.to_string();
        }
        if self.model.is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        self
    }
}

fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

/// Settings file in `dir`, or defaults when it is missing or unreadable.
pub fn read_settings(dir: &Path) -> AiSettings {
    let path = settings_path(dir);
    if !path.exists() {
        return AiSettings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
