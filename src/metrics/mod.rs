//! Prometheus metrics for the push dispatcher.
//!
//! - Dispatch metrics (dispatch count and duration)
//! - Batch metrics (provider calls by shape, provider errors)
//! - Device metrics (results, transmitted / not transmitted)

mod helpers;

pub use helpers::{encode_metrics, PushMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_push";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Total top-level dispatch calls
    pub static ref DISPATCHES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Total dispatch calls"
    ).unwrap();

    /// Time from dispatch start until every batch resolved
    pub static ref DISPATCH_DURATION: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Dispatch duration in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Batch Metrics
    // ============================================================================

    /// Provider calls by call shape
    pub static ref BATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_batches_total", METRIC_PREFIX),
        "Total provider calls",
        &["call"]
    ).unwrap();

    /// Provider calls that returned an error
    pub static ref PROVIDER_ERRORS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_provider_errors_total", METRIC_PREFIX),
        "Total provider calls that errored"
    ).unwrap();

    // ============================================================================
    // Device Metrics
    // ============================================================================

    /// Per-device results produced
    pub static ref DEVICES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_devices_total", METRIC_PREFIX),
        "Total per-device results produced"
    ).unwrap();

    /// Results acknowledged by the provider
    pub static ref TRANSMITTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_transmitted_total", METRIC_PREFIX),
        "Total results acknowledged by the provider"
    ).unwrap();

    /// Results not acknowledged by the provider
    pub static ref NOT_TRANSMITTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_not_transmitted_total", METRIC_PREFIX),
        "Total results not acknowledged by the provider"
    ).unwrap();
}
