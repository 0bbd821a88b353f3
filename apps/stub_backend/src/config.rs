use std::{collections::HashMap, fs};

pub const SETTINGS_FILE: &str = "stub_backend.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub agent_name: String,
    pub company_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            agent_name: "DaisyBot".into(),
            company_name: "Daisy Apparel".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string(SETTINGS_FILE)
        .ok()
        .and_then(|raw| toml::from_str::<HashMap<String, String>>(&raw).ok())
        .unwrap_or_default();
    let mut settings = Settings::default();
    apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());
    apply_overrides(&mut settings, |key| {
        std::env::var(format!("APP__{}", key.to_ascii_uppercase())).ok()
    });
    settings
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("bind_addr") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("agent_name") {
        settings.agent_name = v;
    }
    if let Some(v) = lookup("company_name") {
        settings.company_name = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
