use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use crate::metrics::PushMetrics;

use super::aggregator::{fan_out, index_by_token, join_batches, merge, BatchReport, CallShape};
use super::batcher::slice_devices;
use super::observer::{DispatchObserver, TracingObserver};
use super::payload::{generate_push_id, BatchPayload};
use super::provider::PushProvider;
use super::types::{Device, DispatchResult, NotificationRequest};

/// Statistics for the push dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Top-level dispatch calls
    pub total_dispatches: AtomicU64,
    /// Provider calls made
    pub total_batches: AtomicU64,
    /// Single-recipient provider calls
    pub single_calls: AtomicU64,
    /// Multi-recipient provider calls
    pub multi_calls: AtomicU64,
    /// Provider calls that errored
    pub provider_errors: AtomicU64,
    /// Per-device results produced
    pub total_devices: AtomicU64,
    /// Results acknowledged by the provider
    pub total_transmitted: AtomicU64,
    /// Results not acknowledged by the provider
    pub total_not_transmitted: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_dispatches: self.total_dispatches.load(Ordering::Relaxed),
            total_batches: self.total_batches.load(Ordering::Relaxed),
            single_calls: self.single_calls.load(Ordering::Relaxed),
            multi_calls: self.multi_calls.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            total_devices: self.total_devices.load(Ordering::Relaxed),
            total_transmitted: self.total_transmitted.load(Ordering::Relaxed),
            total_not_transmitted: self.total_not_transmitted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_dispatches: u64,
    pub total_batches: u64,
    pub single_calls: u64,
    pub multi_calls: u64,
    pub provider_errors: u64,
    pub total_devices: u64,
    pub total_transmitted: u64,
    pub total_not_transmitted: u64,
}

/// Sends one notification to an arbitrary number of devices through a push
/// provider.
///
/// Devices are split into batches no larger than the provider's recipient
/// ceiling. Every batch gets its own payload and push id and is sent
/// concurrently with the others; results come back in input order. Provider
/// errors never fail a dispatch, they are recorded on the affected results.
pub struct PushDispatcher {
    provider: Arc<dyn PushProvider>,
    observer: Arc<dyn DispatchObserver>,
    stats: DispatcherStats,
}

impl PushDispatcher {
    /// Create a dispatcher that reports through `tracing`
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self::with_observer(provider, Arc::new(TracingObserver))
    }

    /// Create a dispatcher with a custom observer
    pub fn with_observer(
        provider: Arc<dyn PushProvider>,
        observer: Arc<dyn DispatchObserver>,
    ) -> Self {
        Self {
            provider,
            observer,
            stats: DispatcherStats::default(),
        }
    }

    /// Platform tag of the underlying provider
    pub fn platform(&self) -> &str {
        self.provider.platform()
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Send `request` to every device, stamping all batches with the current
    /// time.
    ///
    /// Returns one result per distinct token. No deadline is applied; wrap the
    /// returned future in `tokio::time::timeout` to bound latency.
    pub async fn send(
        &self,
        request: &NotificationRequest,
        devices: &[Device],
    ) -> Vec<DispatchResult> {
        self.send_at(request, devices, Utc::now().timestamp_millis())
            .await
    }

    /// Same as [`send`](Self::send) with an explicit dispatch timestamp in
    /// epoch milliseconds.
    #[tracing::instrument(
        name = "dispatcher.send",
        skip(self, request, devices),
        fields(device_count = devices.len(), platform = %self.provider.platform())
    )]
    pub async fn send_at(
        &self,
        request: &NotificationRequest,
        devices: &[Device],
        timestamp: i64,
    ) -> Vec<DispatchResult> {
        let started = Instant::now();

        let max_recipients = self.provider.limits().max_recipients;
        let batches = slice_devices(devices, max_recipients);
        if batches.len() > 1 {
            self.observer
                .on_oversized(devices.len(), max_recipients, batches.len());
        }

        let reports = join_batches(
            batches
                .into_iter()
                .map(|batch| self.send_batch(request, batch, timestamp)),
        )
        .await;

        self.record(&reports, started.elapsed());
        merge(reports)
    }

    /// Send one batch with a single provider call
    async fn send_batch(
        &self,
        request: &NotificationRequest,
        batch: &[Device],
        timestamp: i64,
    ) -> BatchReport {
        let push_id = generate_push_id();
        let devices = index_by_token(batch);
        if devices.is_empty() {
            return BatchReport::empty(push_id);
        }

        let mut payload = BatchPayload::build(
            request,
            push_id.clone(),
            timestamp,
            request.effective_expiration(),
            self.provider.limits().max_expiry_seconds,
        );

        let call = if devices.len() == 1 && payload.has_body() {
            CallShape::Single
        } else {
            CallShape::Multi
        };
        self.observer
            .on_batch_sending(&push_id, devices.len(), call);

        let outcome = match call {
            CallShape::Single => {
                let channel_id = devices[0].device_token.clone();
                payload.channel_id = Some(channel_id.clone());
                self.provider.push_single(&payload, &channel_id).await
            }
            CallShape::Multi => {
                let channel_ids: Vec<String> =
                    devices.iter().map(|d| d.device_token.clone()).collect();
                self.provider.push_all(&payload, &channel_ids).await
            }
        };

        match &outcome {
            Ok(response) => self.observer.on_batch_completed(&push_id, response),
            Err(error) => self.observer.on_batch_failed(&push_id, error),
        }

        BatchReport {
            push_id,
            call: Some(call),
            provider_error: outcome.is_err(),
            results: fan_out(&devices, self.provider.platform(), &outcome),
        }
    }

    /// Fold finished batch reports into stats and metrics
    fn record(&self, reports: &[BatchReport], elapsed: Duration) {
        let mut single = 0u64;
        let mut multi = 0u64;
        let mut errors = 0u64;
        let mut devices = 0u64;
        let mut transmitted = 0u64;

        for report in reports {
            match report.call {
                Some(CallShape::Single) => single += 1,
                Some(CallShape::Multi) => multi += 1,
                None => {}
            }
            if report.provider_error {
                errors += 1;
            }
            devices += report.results.len() as u64;
            transmitted += report.results.iter().filter(|r| r.transmitted).count() as u64;
        }
        let not_transmitted = devices - transmitted;

        self.stats.total_dispatches.fetch_add(1, Ordering::Relaxed);
        self.stats
            .total_batches
            .fetch_add(single + multi, Ordering::Relaxed);
        self.stats.single_calls.fetch_add(single, Ordering::Relaxed);
        self.stats.multi_calls.fetch_add(multi, Ordering::Relaxed);
        self.stats.provider_errors.fetch_add(errors, Ordering::Relaxed);
        self.stats.total_devices.fetch_add(devices, Ordering::Relaxed);
        self.stats
            .total_transmitted
            .fetch_add(transmitted, Ordering::Relaxed);
        self.stats
            .total_not_transmitted
            .fetch_add(not_transmitted, Ordering::Relaxed);

        PushMetrics::record_dispatch(elapsed.as_secs_f64());
        PushMetrics::record_batches(CallShape::Single, single);
        PushMetrics::record_batches(CallShape::Multi, multi);
        PushMetrics::record_provider_errors(errors);
        PushMetrics::record_devices(devices, transmitted);

        tracing::debug!(
            batches = single + multi,
            devices,
            transmitted,
            provider_errors = errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "Dispatch completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::provider::{ProviderError, ProviderLimits, ProviderResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Call {
        shape: CallShape,
        payload: BatchPayload,
        recipients: Vec<String>,
    }

    /// Provider double recording every call; batches containing a token
    /// starting with `fail` are rejected.
    struct RecordingProvider {
        limits: ProviderLimits,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingProvider {
        fn new(max_recipients: usize) -> Arc<Self> {
            Arc::new(Self {
                limits: ProviderLimits {
                    max_recipients,
                    ..ProviderLimits::default()
                },
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: Call) -> Result<ProviderResponse, ProviderError> {
            let fail = call.recipients.iter().any(|t| t.starts_with("fail"));
            self.calls.lock().unwrap().push(call);
            if fail {
                Err(ProviderError::Rejected {
                    code: 30_600,
                    message: "Internal Server Error".to_string(),
                })
            } else {
                Ok(ProviderResponse::new(json!({
                    "request_id": 42,
                    "response_params": {"msg_id": "msg-1"}
                })))
            }
        }
    }

    #[async_trait]
    impl PushProvider for RecordingProvider {
        fn platform(&self) -> &str {
            "android"
        }

        fn limits(&self) -> ProviderLimits {
            self.limits
        }

        async fn push_single(
            &self,
            payload: &BatchPayload,
            channel_id: &str,
        ) -> Result<ProviderResponse, ProviderError> {
            self.answer(Call {
                shape: CallShape::Single,
                payload: payload.clone(),
                recipients: vec![channel_id.to_string()],
            })
        }

        async fn push_all(
            &self,
            payload: &BatchPayload,
            channel_ids: &[String],
        ) -> Result<ProviderResponse, ProviderError> {
            self.answer(Call {
                shape: CallShape::Multi,
                payload: payload.clone(),
                recipients: channel_ids.to_vec(),
            })
        }
    }

    fn devices(prefix: &str, count: usize) -> Vec<Device> {
        (0..count)
            .map(|i| Device::new(format!("{}-{}", prefix, i)))
            .collect()
    }

    fn tokens(results: &[DispatchResult]) -> Vec<String> {
        results
            .iter()
            .map(|r| r.device.device_token.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_single_device_uses_single_call() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"}));

        let results = dispatcher.send(&request, &devices("dev", 1)).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, CallShape::Single);
        assert_eq!(calls[0].payload.channel_id.as_deref(), Some("dev-0"));
        assert_eq!(results.len(), 1);
        assert!(results[0].transmitted);
        assert_eq!(results[0].request_id, Some(json!(42)));
    }

    #[tokio::test]
    async fn test_single_device_with_null_data_uses_single_call() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request: NotificationRequest = serde_json::from_value(json!({"data": null})).unwrap();

        dispatcher.send(&request, &devices("dev", 1)).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, CallShape::Single);
        assert_eq!(calls[0].payload.msg.as_deref(), Some("null"));
        assert_eq!(calls[0].payload.channel_id.as_deref(), Some("dev-0"));
    }

    #[tokio::test]
    async fn test_single_device_without_data_uses_single_call() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());

        let results = dispatcher
            .send(&NotificationRequest::default(), &devices("dev", 1))
            .await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, CallShape::Single);
        assert_eq!(calls[0].payload.msg, None);
        assert_eq!(calls[0].payload.channel_id.as_deref(), Some("dev-0"));
        assert!(results[0].transmitted);
    }

    #[tokio::test]
    async fn test_many_devices_use_multi_call() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"}));

        let results = dispatcher.send(&request, &devices("dev", 3)).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, CallShape::Multi);
        assert_eq!(calls[0].payload.channel_id, None);
        assert_eq!(tokens(&results), vec!["dev-0", "dev-1", "dev-2"]);
        assert!(results
            .iter()
            .all(|r| r.device.device_type.as_deref() == Some("android")));
    }

    #[tokio::test]
    async fn test_oversized_input_is_batched_in_order() {
        let provider = RecordingProvider::new(10_000);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"})).expires_at(61_000);
        let input = devices("dev", 25_000);

        let results = dispatcher.send_at(&request, &input, 1_000).await;

        let calls = provider.calls();
        let mut sizes: Vec<usize> = calls.iter().map(|c| c.recipients.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![5_000, 10_000, 10_000]);

        // Shared timestamp, own push id per batch
        assert!(calls.iter().all(|c| c.payload.timestamp == 1_000));
        assert!(calls.iter().all(|c| c.payload.msg_expires == Some(60)));
        let mut push_ids: Vec<&str> = calls.iter().map(|c| c.payload.push_id.as_str()).collect();
        push_ids.sort_unstable();
        push_ids.dedup();
        assert_eq!(push_ids.len(), 3);

        assert_eq!(results.len(), 25_000);
        let expected: Vec<String> = input.iter().map(|d| d.device_token.clone()).collect();
        assert_eq!(tokens(&results), expected);

        let stats = dispatcher.stats();
        assert_eq!(stats.total_dispatches, 1);
        assert_eq!(stats.total_batches, 3);
        assert_eq!(stats.multi_calls, 3);
        assert_eq!(stats.total_transmitted, 25_000);
    }

    #[tokio::test]
    async fn test_partial_failure_is_folded_into_results() {
        let provider = RecordingProvider::new(2);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"}));
        let input = vec![
            Device::new("fail-a"),
            Device::new("fail-b"),
            Device::new("ok-c"),
            Device::new("ok-d"),
        ];

        let results = dispatcher.send(&request, &input).await;

        assert_eq!(tokens(&results), vec!["fail-a", "fail-b", "ok-c", "ok-d"]);
        for result in &results[..2] {
            assert!(!result.transmitted);
            assert!(result.response.is_error());
            assert_eq!(result.request_id, None);
        }
        for result in &results[2..] {
            assert!(result.transmitted);
            assert!(!result.response.is_error());
        }

        let stats = dispatcher.stats();
        assert_eq!(stats.provider_errors, 1);
        assert_eq!(stats.total_not_transmitted, 2);
    }

    #[tokio::test]
    async fn test_duplicate_tokens_collapse() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"}));
        let mut second = Device::new("dup");
        second.extra.insert("order".to_string(), json!(2));
        let input = vec![Device::new("dup"), Device::new("other"), second];

        let results = dispatcher.send(&request, &input).await;

        assert_eq!(tokens(&results), vec!["dup", "other"]);
        assert_eq!(results[0].device.extra.get("order"), Some(&json!(2)));
        assert_eq!(provider.calls()[0].recipients, vec!["dup", "other"]);
    }

    #[tokio::test]
    async fn test_duplicate_collapse_to_single_recipient() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());
        let request = NotificationRequest::new(json!({"alert": "hi"}));

        let results = dispatcher
            .send(&request, &[Device::new("same"), Device::new("same")])
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(provider.calls()[0].shape, CallShape::Single);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let provider = RecordingProvider::new(10);
        let dispatcher = PushDispatcher::new(provider.clone());

        let results = dispatcher
            .send(&NotificationRequest::new(json!({})), &[])
            .await;

        assert!(results.is_empty());
        assert!(provider.calls().is_empty());
        assert_eq!(dispatcher.stats().total_batches, 0);
    }

    #[tokio::test]
    async fn test_caller_devices_untouched() {
        let provider = RecordingProvider::new(1);
        let dispatcher = PushDispatcher::new(provider);
        let input = devices("dev", 3);
        let before = input.clone();

        dispatcher
            .send(&NotificationRequest::new(json!({"alert": "hi"})), &input)
            .await;

        assert_eq!(input, before);
    }

    #[derive(Default)]
    struct CountingObserver {
        oversized: AtomicU64,
        sending: AtomicU64,
        completed: AtomicU64,
        failed: AtomicU64,
    }

    impl DispatchObserver for CountingObserver {
        fn on_oversized(&self, _: usize, _: usize, _: usize) {
            self.oversized.fetch_add(1, Ordering::Relaxed);
        }
        fn on_batch_sending(&self, _: &str, _: usize, _: CallShape) {
            self.sending.fetch_add(1, Ordering::Relaxed);
        }
        fn on_batch_completed(&self, _: &str, _: &ProviderResponse) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
        fn on_batch_failed(&self, _: &str, _: &ProviderError) {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn test_observer_receives_events() {
        let provider = RecordingProvider::new(2);
        let observer = Arc::new(CountingObserver::default());
        let dispatcher = PushDispatcher::with_observer(provider, observer.clone());
        let input = vec![
            Device::new("ok-a"),
            Device::new("ok-b"),
            Device::new("fail-c"),
        ];

        dispatcher
            .send(&NotificationRequest::new(json!({"alert": "hi"})), &input)
            .await;

        assert_eq!(observer.oversized.load(Ordering::Relaxed), 1);
        assert_eq!(observer.sending.load(Ordering::Relaxed), 2);
        assert_eq!(observer.completed.load(Ordering::Relaxed), 1);
        assert_eq!(observer.failed.load(Ordering::Relaxed), 1);
    }
}
