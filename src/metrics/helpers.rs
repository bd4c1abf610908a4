//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::push::CallShape;

use super::{
    BATCHES_TOTAL, DEVICES_TOTAL, DISPATCHES_TOTAL, DISPATCH_DURATION, NOT_TRANSMITTED_TOTAL,
    PROVIDER_ERRORS_TOTAL, TRANSMITTED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct PushMetrics;

impl PushMetrics {
    /// Record a finished dispatch
    pub fn record_dispatch(duration_secs: f64) {
        DISPATCHES_TOTAL.inc();
        DISPATCH_DURATION.observe(duration_secs);
    }

    /// Record provider calls of one shape
    pub fn record_batches(call: CallShape, count: u64) {
        BATCHES_TOTAL.with_label_values(&[call.as_str()]).inc_by(count);
    }

    /// Record failed provider calls
    pub fn record_provider_errors(count: u64) {
        PROVIDER_ERRORS_TOTAL.inc_by(count);
    }

    /// Record per-device results
    pub fn record_devices(total: u64, transmitted: u64) {
        DEVICES_TOTAL.inc_by(total);
        TRANSMITTED_TOTAL.inc_by(transmitted);
        NOT_TRANSMITTED_TOTAL.inc_by(total.saturating_sub(transmitted));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_metrics() {
        PushMetrics::record_dispatch(0.01);
        PushMetrics::record_batches(CallShape::Single, 1);
        PushMetrics::record_batches(CallShape::Multi, 2);
        PushMetrics::record_provider_errors(1);
        PushMetrics::record_devices(5, 3);

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_push_batches_total"));
        assert!(output.contains("ara_push_transmitted_total"));
    }
}
