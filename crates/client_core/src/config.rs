use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use shared::protocol::DEFAULT_CONTENT_FIELD;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "chat.toml";
pub const DEFAULT_FALLBACK_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// What `submit` does while a turn is still awaiting its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Dispatch the new turn; the older one becomes stale and its reply is dropped.
    #[default]
    Supersede,
    /// Refuse the submit without touching the transcript.
    Reject,
}

impl OverlapPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supersede" => Some(Self::Supersede),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasoningRetention {
    #[default]
    Latest,
    History {
        limit: usize,
    },
}

impl ReasoningRetention {
    pub fn from_history_len(len: usize) -> Self {
        if len <= 1 {
            Self::Latest
        } else {
            Self::History { limit: len }
        }
    }

    pub fn limit(self) -> usize {
        match self {
            Self::Latest => 1,
            Self::History { limit } => limit,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid chat endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("content field name must not be empty")]
    EmptyContentField,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("fallback text must not be empty")]
    EmptyFallbackText,
    #[error("transcript cap must be at least 2 entries")]
    TranscriptCapTooSmall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub chat_endpoint: String,
    pub content_field: String,
    pub request_timeout: Duration,
    pub fallback_text: String,
    pub overlap_policy: OverlapPolicy,
    pub reasoning_retention: ReasoningRetention,
    pub transcript_cap: Option<usize>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            chat_endpoint: "http://127.0.0.1:8000/chat".into(),
            content_field: DEFAULT_CONTENT_FIELD.into(),
            request_timeout: Duration::from_secs(30),
            fallback_text: DEFAULT_FALLBACK_TEXT.into(),
            overlap_policy: OverlapPolicy::Supersede,
            reasoning_retention: ReasoningRetention::Latest,
            transcript_cap: None,
        }
    }
}

impl ControllerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        if self.content_field.trim().is_empty() {
            return Err(ConfigError::EmptyContentField);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.fallback_text.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackText);
        }
        if matches!(self.transcript_cap, Some(cap) if cap < 2) {
            return Err(ConfigError::TranscriptCapTooSmall);
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.chat_endpoint.clone(),
            reason,
        };
        let url = Url::parse(self.chat_endpoint.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(url)
    }
}

/// Defaults, then `chat.toml` in the working directory, then the process environment.
pub fn load_settings() -> ControllerSettings {
    let mut settings = ControllerSettings::default();
    if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
        match parse_settings_file(&raw) {
            Ok(file_cfg) => apply_overrides(&mut settings, |key| file_cfg.get(key).cloned()),
            Err(err) => tracing::warn!(file = DEFAULT_SETTINGS_FILE, %err, "ignoring unreadable settings file"),
        }
    }
    apply_env_overrides(&mut settings);
    settings
}

/// Like [`load_settings`] but with an explicit file that must exist and parse.
pub fn load_settings_from(path: &Path) -> anyhow::Result<ControllerSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg = parse_settings_file(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    let mut settings = ControllerSettings::default();
    apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn parse_settings_file(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    let table = toml::from_str::<HashMap<String, toml::Value>>(raw)?;
    Ok(table
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                toml::Value::String(text) => text,
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Float(number) => number.to_string(),
                toml::Value::Boolean(flag) => flag.to_string(),
                _ => return None,
            };
            Some((key, text))
        })
        .collect())
}

fn apply_env_overrides(settings: &mut ControllerSettings) {
    apply_overrides(settings, |key| {
        let upper = key.to_ascii_uppercase();
        let prefixed = std::env::var(format!("APP__{upper}")).ok();
        if key == "chat_endpoint" {
            prefixed.or_else(|| std::env::var("CHAT_ENDPOINT").ok())
        } else {
            prefixed
        }
    });
}

pub(crate) fn apply_overrides(
    settings: &mut ControllerSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("chat_endpoint") {
        settings.chat_endpoint = v;
    }
    if let Some(v) = lookup("content_field") {
        settings.content_field = v;
    }
    if let Some(v) = lookup("request_timeout_secs") {
        match v.trim().parse::<u64>() {
            Ok(secs) => settings.request_timeout = Duration::from_secs(secs),
            Err(err) => tracing::warn!(value = %v, %err, "ignoring invalid request_timeout_secs"),
        }
    }
    if let Some(v) = lookup("fallback_text") {
        settings.fallback_text = v;
    }
    if let Some(v) = lookup("overlap_policy") {
        match OverlapPolicy::parse(&v) {
            Some(policy) => settings.overlap_policy = policy,
            None => tracing::warn!(value = %v, "ignoring unknown overlap_policy"),
        }
    }
    if let Some(v) = lookup("reasoning_history") {
        match v.trim().parse::<usize>() {
            Ok(len) => settings.reasoning_retention = ReasoningRetention::from_history_len(len),
            Err(err) => tracing::warn!(value = %v, %err, "ignoring invalid reasoning_history"),
        }
    }
    if let Some(v) = lookup("transcript_cap") {
        match v.trim().parse::<usize>() {
            Ok(0) => settings.transcript_cap = None,
            Ok(cap) => settings.transcript_cap = Some(cap),
            Err(err) => tracing::warn!(value = %v, %err, "ignoring invalid transcript_cap"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
