use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::provider::{ProviderError, ProviderResponse};

/// A push target as supplied by the caller.
///
/// Only `device_token` is interpreted by the dispatcher. Any other fields the
/// caller sends along (installation id, app version, ...) are carried through
/// untouched so the result can be matched back to the caller's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Provider channel identifier, unique within one dispatch call
    pub device_token: String,
    /// Platform tag, written by the dispatcher once the device was processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Extra caller fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Create a device with just a token
    pub fn new(device_token: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            device_type: None,
            extra: Map::new(),
        }
    }

    /// Copy of this device annotated with the given platform tag
    pub fn with_platform(&self, platform: &str) -> Self {
        Self {
            device_type: Some(platform.to_string()),
            ..self.clone()
        }
    }
}

/// The logical notification handed to the dispatcher.
///
/// Never mutated by a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Arbitrary JSON payload, serialized into the message body.
    /// An explicit `null` is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    /// Absolute expiry instant in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
}

impl NotificationRequest {
    /// Create a request carrying `data` and no expiry
    pub fn new(data: Value) -> Self {
        Self {
            data: Some(data),
            expiration_time: None,
        }
    }

    /// Set the absolute expiry instant (epoch milliseconds)
    pub fn expires_at(mut self, expiration_time: i64) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    /// Expiry to apply to the wire payload.
    ///
    /// A zero instant is treated the same as an absent one.
    pub fn effective_expiration(&self) -> Option<i64> {
        self.expiration_time.filter(|t| *t != 0)
    }
}

/// Deserialize a field that is present in the input, including `null`, as
/// `Some`. Paired with `#[serde(default)]` so only a missing field is `None`.
pub(crate) fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Raw provider outcome recorded on every device of a batch
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DispatchOutcome {
    /// Provider answered; the raw body is kept as-is
    Response(Value),
    /// Provider call failed
    Error { error: ProviderError },
}

impl DispatchOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, DispatchOutcome::Error { .. })
    }
}

impl From<&Result<ProviderResponse, ProviderError>> for DispatchOutcome {
    fn from(result: &Result<ProviderResponse, ProviderError>) -> Self {
        match result {
            Ok(response) => DispatchOutcome::Response(response.raw().clone()),
            Err(error) => DispatchOutcome::Error {
                error: error.clone(),
            },
        }
    }
}

/// Per-device result of a dispatch
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    /// The originating device, with its platform tag set
    pub device: Device,
    /// Provider-assigned request identifier for the batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
    /// Provider response or error for the batch
    pub response: DispatchOutcome,
    /// Whether the provider acknowledged the message
    pub transmitted: bool,
}
