//! Push dispatch endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::push::{deserialize_present, Device, DispatchResult, NotificationRequest};
use crate::server::AppState;

/// Expiry as sent by API callers
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExpirationTime {
    /// Epoch milliseconds
    Millis(i64),
    /// Fractional epoch milliseconds, floored
    FractionalMillis(f64),
    /// RFC 3339 timestamp
    Timestamp(DateTime<Utc>),
}

impl ExpirationTime {
    pub fn as_millis(&self) -> i64 {
        match self {
            ExpirationTime::Millis(ms) => *ms,
            ExpirationTime::FractionalMillis(ms) => ms.floor() as i64,
            ExpirationTime::Timestamp(at) => at.timestamp_millis(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub data: Option<Value>,
    #[serde(default)]
    pub expiration_time: Option<ExpirationTime>,
    pub devices: Vec<Device>,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub dispatch_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub transmitted: usize,
    pub failed: usize,
    pub results: Vec<DispatchResult>,
}

/// POST /api/v1/push - send one notification to a list of devices
#[tracing::instrument(
    name = "http.send_push",
    skip(state, request),
    fields(device_count = request.devices.len())
)]
pub async fn send_push(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    if let Some(pos) = request
        .devices
        .iter()
        .position(|d| d.device_token.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "devices[{}]: deviceToken must not be empty",
            pos
        )));
    }

    let notification = NotificationRequest {
        data: request.data,
        expiration_time: request.expiration_time.map(|t| t.as_millis()),
    };

    let now = Utc::now();
    let results = state
        .dispatcher
        .send_at(&notification, &request.devices, now.timestamp_millis())
        .await;

    let transmitted = results.iter().filter(|r| r.transmitted).count();
    let dispatch_id = Uuid::new_v4();

    tracing::info!(
        dispatch_id = %dispatch_id,
        total = results.len(),
        transmitted,
        "Push dispatched"
    );

    Ok(Json(PushResponse {
        dispatch_id,
        timestamp: now,
        total: results.len(),
        transmitted,
        failed: results.len() - transmitted,
        results,
    }))
}
