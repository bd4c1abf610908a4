//! Dispatch observability hooks.
//!
//! The dispatcher reports what it does through a `DispatchObserver` handed to
//! it at construction instead of logging on its own.

use super::aggregator::CallShape;
use super::provider::{ProviderError, ProviderResponse};

/// Receives dispatch lifecycle events
pub trait DispatchObserver: Send + Sync {
    /// Input exceeded the provider ceiling and was split
    fn on_oversized(&self, device_count: usize, max_recipients: usize, batch_count: usize);

    /// A provider call is about to be made
    fn on_batch_sending(&self, push_id: &str, device_count: usize, call: CallShape);

    /// The provider answered
    fn on_batch_completed(&self, push_id: &str, response: &ProviderResponse);

    /// The provider call failed
    fn on_batch_failed(&self, push_id: &str, error: &ProviderError);
}

/// Default observer emitting `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_oversized(&self, device_count: usize, max_recipients: usize, batch_count: usize) {
        tracing::debug!(
            device_count,
            max_recipients,
            batch_count,
            "Device count exceeds provider ceiling, splitting into batches"
        );
    }

    fn on_batch_sending(&self, push_id: &str, device_count: usize, call: CallShape) {
        tracing::debug!(
            push_id = %push_id,
            device_count,
            call = call.as_str(),
            "Sending to {} {}",
            device_count,
            if device_count > 1 { "devices" } else { "device" }
        );
    }

    fn on_batch_completed(&self, push_id: &str, response: &ProviderResponse) {
        tracing::debug!(
            push_id = %push_id,
            response = %response.raw(),
            transmitted = response.is_transmitted(),
            "Provider response"
        );
    }

    fn on_batch_failed(&self, push_id: &str, error: &ProviderError) {
        tracing::error!(push_id = %push_id, error = %error, "Provider send errored");
    }
}
