//! Provider adapter abstraction.
//!
//! A provider adapter wraps one concrete push service. The dispatcher only
//! relies on the two call shapes defined here and on the provider's limits;
//! wire formats stay inside the adapter.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::payload::BatchPayload;

/// Maximum recipients accepted by a single provider call
pub const DEFAULT_MAX_RECIPIENTS: usize = 10_000;

/// Longest expiry window a provider accepts (one week)
pub const DEFAULT_MAX_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Errors reported by a provider call.
///
/// These are folded into every result of the affected batch, so they must be
/// cheap to clone and serializable.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// Provider answered with an error code
    #[error("Provider rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    /// Request never got a provider answer
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Provider answer could not be understood
    #[error("Invalid provider response: {message}")]
    InvalidResponse { message: String },
}

/// Errors raised while constructing a provider adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushConfigError {
    /// A required credential is missing or blank
    #[error("Push provider configuration is invalid: missing {0}")]
    MissingCredential(&'static str),

    /// The configured provider kind is not known
    #[error("Unknown push provider: {0}")]
    UnknownProvider(String),

    /// A provider limit is out of range
    #[error("Invalid push provider limit: {0}")]
    InvalidLimit(String),
}

/// Raw response body of a successful provider call
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse(Value);

impl ProviderResponse {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Top-level request identifier assigned by the provider
    pub fn request_id(&self) -> Option<&Value> {
        self.0.get("request_id").filter(|v| !v.is_null())
    }

    /// Message identifier nested in the success parameters, if truthy
    pub fn message_id(&self) -> Option<&Value> {
        self.0
            .get("response_params")
            .and_then(|params| params.get("msg_id"))
            .filter(|id| is_truthy(id))
    }

    /// Whether the provider acknowledged the message
    pub fn is_transmitted(&self) -> bool {
        self.message_id().is_some()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Credentials every provider adapter is constructed from
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub sender_id: Option<String>,
    pub api_key: Option<String>,
}

impl ProviderCredentials {
    pub fn new(sender_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            sender_id: Some(sender_id.into()),
            api_key: Some(api_key.into()),
        }
    }

    /// Reject missing or blank credentials
    pub fn validate(&self) -> Result<(), PushConfigError> {
        if self.sender_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(PushConfigError::MissingCredential("sender_id"));
        }
        if self.api_key.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(PushConfigError::MissingCredential("api_key"));
        }
        Ok(())
    }
}

/// Per-provider ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderLimits {
    /// Maximum recipients per call
    pub max_recipients: usize,
    /// Maximum expiry window in seconds
    pub max_expiry_seconds: u64,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            max_recipients: DEFAULT_MAX_RECIPIENTS,
            max_expiry_seconds: DEFAULT_MAX_EXPIRY_SECONDS,
        }
    }
}

impl ProviderLimits {
    pub fn validate(&self) -> Result<(), PushConfigError> {
        if self.max_recipients == 0 {
            return Err(PushConfigError::InvalidLimit(
                "max_recipients must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniform interface over concrete push providers.
///
/// Each call delivers exactly one outcome for the whole batch; providers do
/// not report per-device results.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Platform tag written onto every processed device
    fn platform(&self) -> &str;

    /// Recipient and expiry ceilings of this provider
    fn limits(&self) -> ProviderLimits;

    /// Push to a single channel. `payload.channel_id` is set to `channel_id`.
    async fn push_single(
        &self,
        payload: &BatchPayload,
        channel_id: &str,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Push to every recipient of the batch
    async fn push_all(
        &self,
        payload: &BatchPayload,
        channel_ids: &[String],
    ) -> Result<ProviderResponse, ProviderError>;
}
