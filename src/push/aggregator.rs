//! Per-batch result fan-out and cross-batch fan-in.

use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;

use super::provider::{ProviderError, ProviderResponse};
use super::types::{Device, DispatchOutcome, DispatchResult};

/// Provider call shape used for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// One recipient addressed by channel id
    Single,
    /// Whole batch in one call
    Multi,
}

impl CallShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallShape::Single => "single",
            CallShape::Multi => "multi",
        }
    }
}

/// Everything one batch produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub push_id: String,
    /// `None` when the batch had no recipients and no call was made
    pub call: Option<CallShape>,
    pub provider_error: bool,
    pub results: Vec<DispatchResult>,
}

impl BatchReport {
    pub fn empty(push_id: String) -> Self {
        Self {
            push_id,
            call: None,
            provider_error: false,
            results: Vec::new(),
        }
    }
}

/// Devices of a batch keyed by token.
///
/// A repeated token keeps the position of its first occurrence and the record
/// of its last one.
pub fn index_by_token(batch: &[Device]) -> Vec<&Device> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(batch.len());
    let mut devices: Vec<&Device> = Vec::with_capacity(batch.len());

    for device in batch {
        match positions.get(device.device_token.as_str()) {
            Some(&pos) => devices[pos] = device,
            None => {
                positions.insert(device.device_token.as_str(), devices.len());
                devices.push(device);
            }
        }
    }

    devices
}

/// Map one batch-level provider outcome onto every device of the batch
pub fn fan_out(
    devices: &[&Device],
    platform: &str,
    outcome: &Result<ProviderResponse, ProviderError>,
) -> Vec<DispatchResult> {
    let (request_id, transmitted) = match outcome {
        Ok(response) => (response.request_id().cloned(), response.is_transmitted()),
        Err(_) => (None, false),
    };
    let response = DispatchOutcome::from(outcome);

    devices
        .iter()
        .map(|device| DispatchResult {
            device: device.with_platform(platform),
            request_id: request_id.clone(),
            response: response.clone(),
            transmitted,
        })
        .collect()
}

/// Concatenate batch reports in batch order
pub fn merge(reports: Vec<BatchReport>) -> Vec<DispatchResult> {
    let total = reports.iter().map(|r| r.results.len()).sum();
    reports
        .into_iter()
        .fold(Vec::with_capacity(total), |mut all, report| {
            all.extend(report.results);
            all
        })
}

/// Drive every batch future concurrently and return the reports in the
/// order the futures were supplied.
pub async fn join_batches<I, F>(batches: I) -> Vec<BatchReport>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = BatchReport>,
{
    join_all(batches).await
}
