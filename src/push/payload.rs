//! Provider-shaped message construction.

use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;

use super::types::NotificationRequest;

/// Message type marker for notification messages
pub const MSG_TYPE_NOTIFICATION: u8 = 1;

/// Length of generated push ids
const PUSH_ID_LEN: usize = 10;

/// Wire payload built once per batch and shared by every device in it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPayload {
    /// Correlation token for this provider call; not part of the wire body
    #[serde(skip)]
    pub push_id: String,
    pub msg_type: u8,
    /// Serialized `data` of the request; absent when the request has no `data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Dispatch instant in epoch milliseconds
    pub timestamp: i64,
    /// Seconds until the provider may drop the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_expires: Option<u64>,
    /// Target channel, set only for single-recipient calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl BatchPayload {
    /// Build the payload for one batch.
    ///
    /// Only `request.data` reaches the message body. An explicit JSON `null`
    /// becomes the body `"null"`; a missing `data` leaves `msg` unset.
    pub fn build(
        request: &NotificationRequest,
        push_id: impl Into<String>,
        timestamp: i64,
        expiration_time: Option<i64>,
        max_expiry_seconds: u64,
    ) -> Self {
        let msg = request.data.as_ref().map(|data| data.to_string());

        Self {
            push_id: push_id.into(),
            msg_type: MSG_TYPE_NOTIFICATION,
            msg,
            timestamp,
            msg_expires: expiration_time
                .map(|expiration| expiry_seconds(expiration, timestamp, max_expiry_seconds)),
            channel_id: None,
        }
    }

    /// False only for an explicitly empty body; an unset `msg` still counts.
    pub fn has_body(&self) -> bool {
        self.msg.as_deref() != Some("")
    }
}

/// Whole seconds between `timestamp` and `expiration_time`, clamped to
/// `[0, max_expiry_seconds]`. Both instants are epoch milliseconds.
pub fn expiry_seconds(expiration_time: i64, timestamp: i64, max_expiry_seconds: u64) -> u64 {
    let seconds = expiration_time.saturating_sub(timestamp).div_euclid(1000);
    if seconds <= 0 {
        0
    } else {
        (seconds as u64).min(max_expiry_seconds)
    }
}

/// Random alphanumeric push id
pub fn generate_push_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PUSH_ID_LEN)
        .map(char::from)
        .collect()
}
