//! Provider adapter that logs every call instead of reaching a push service.
//!
//! Useful for local runs and staging: the dispatcher behaves exactly as with a
//! real provider and every call is acknowledged with a synthetic response.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::payload::BatchPayload;
use super::provider::{
    ProviderCredentials, ProviderError, ProviderLimits, ProviderResponse, PushConfigError,
    PushProvider,
};

pub struct LoggingProvider {
    sender_id: String,
    platform: String,
    limits: ProviderLimits,
    next_request_id: AtomicU64,
}

impl LoggingProvider {
    /// Create the adapter, rejecting incomplete credentials or limits
    pub fn new(
        credentials: &ProviderCredentials,
        platform: impl Into<String>,
        limits: ProviderLimits,
    ) -> Result<Self, PushConfigError> {
        credentials.validate()?;
        limits.validate()?;

        Ok(Self {
            sender_id: credentials.sender_id.clone().unwrap_or_default(),
            platform: platform.into(),
            limits,
            next_request_id: AtomicU64::new(1),
        })
    }

    fn acknowledge(&self, payload: &BatchPayload) -> ProviderResponse {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        ProviderResponse::new(json!({
            "request_id": request_id,
            "response_params": {
                "msg_id": payload.push_id,
                "send_time": Utc::now().timestamp(),
            }
        }))
    }
}

#[async_trait]
impl PushProvider for LoggingProvider {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn limits(&self) -> ProviderLimits {
        self.limits
    }

    async fn push_single(
        &self,
        payload: &BatchPayload,
        channel_id: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        tracing::info!(
            target: "push",
            sender_id = %self.sender_id,
            push_id = %payload.push_id,
            channel_id = %channel_id,
            msg = ?payload.msg,
            msg_expires = ?payload.msg_expires,
            "push_single (logged)"
        );
        Ok(self.acknowledge(payload))
    }

    async fn push_all(
        &self,
        payload: &BatchPayload,
        channel_ids: &[String],
    ) -> Result<ProviderResponse, ProviderError> {
        tracing::info!(
            target: "push",
            sender_id = %self.sender_id,
            push_id = %payload.push_id,
            recipients = channel_ids.len(),
            msg = ?payload.msg,
            msg_expires = ?payload.msg_expires,
            "push_all (logged)"
        );
        Ok(self.acknowledge(payload))
    }
}
