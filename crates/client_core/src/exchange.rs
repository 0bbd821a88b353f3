//! Backend exchange: one POST per turn, raw body back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ParseError, ParseErrorKind},
    protocol::ChatRequest,
};
use thiserror::Error;
use url::Url;

use crate::config::{ConfigError, ControllerSettings};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to reach chat backend: {0}")]
    Connect(String),
    #[error("chat backend did not answer within {0:?}")]
    Timeout(Duration),
    #[error("chat backend returned HTTP {0}")]
    Status(u16),
    #[error("failed to read chat backend response: {0}")]
    Body(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFailureKind {
    Transport,
    MalformedJson,
    MissingField,
}

/// Everything that can sink a single turn. None of it is fatal to the session.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid reasoning payload: {0}")]
    Parse(#[from] ParseError),
}

impl ExchangeError {
    pub fn kind(&self) -> TurnFailureKind {
        match self {
            Self::Transport(_) => TurnFailureKind::Transport,
            Self::Parse(err) => match err.kind {
                ParseErrorKind::MalformedJson => TurnFailureKind::MalformedJson,
                ParseErrorKind::MissingField => TurnFailureKind::MissingField,
            },
        }
    }
}

#[async_trait]
pub trait BackendExchange: Send + Sync {
    /// Send one user message and return the raw response body of a 2xx reply.
    async fn exchange(&self, message: &str) -> Result<Vec<u8>, TransportError>;
}

pub struct HttpExchange {
    http: Client,
    endpoint: Url,
    content_field: String,
}

impl HttpExchange {
    pub fn new(settings: &ControllerSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            http: Client::new(),
            endpoint: settings.endpoint_url()?,
            content_field: settings.content_field.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl BackendExchange for HttpExchange {
    async fn exchange(&self, message: &str) -> Result<Vec<u8>, TransportError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&ChatRequest::new(&self.content_field, message))
            .send()
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), endpoint = %self.endpoint, "chat backend rejected turn");
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| TransportError::Body(err.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/exchange_tests.rs"]
mod tests;
