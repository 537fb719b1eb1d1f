//! Outbound delivery seam.
//!
//! Dispatch talks to the outside world only through [`Outbound`], so the
//! pipeline can be exercised in tests with a recording fake while the
//! server wires in the reqwest implementation.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Config(String),
}

/// One-way JSON delivery. Success is any 2xx response; everything else is
/// an error whose message ends up in the notification row.
#[async_trait]
pub trait Outbound: Send + Sync + 'static {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), OutboundError>;
}

/// Production implementation over a shared reqwest client.
#[derive(Clone, Default)]
pub struct HttpOutbound {
    client: reqwest::Client,
}

impl HttpOutbound {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Outbound for HttpOutbound {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), OutboundError> {
        let resp = self.client.post(url).json(body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(OutboundError::Status { status, body });
        }
        Ok(())
    }
}

/// An outbound that records every call instead of sending it. Used in
/// tests to assert delivery payloads and to simulate failures.
#[derive(Default)]
pub struct RecordingOutbound {
    calls: std::sync::Mutex<Vec<(String, serde_json::Value)>>,
    failure: std::sync::Mutex<Option<String>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with the given reason.
    pub fn set_failure(&self, reason: Option<&str>) {
        if let Ok(mut f) = self.failure.lock() {
            *f = reason.map(|r| r.to_string());
        }
    }

    /// Everything posted so far, as `(url, body)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), OutboundError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((url.to_string(), body.clone()));
        }
        let failure = self.failure.lock().map(|f| f.clone()).unwrap_or_default();
        match failure {
            Some(reason) => Err(OutboundError::Config(reason)),
            None => Ok(()),
        }
    }
}
