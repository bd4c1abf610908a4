//! Batched push notification dispatch.
//!
//! A dispatch takes one [`NotificationRequest`] and any number of [`Device`]s
//! and produces one [`DispatchResult`] per distinct device token:
//!
//! - `batcher`: splits devices into provider-sized batches
//! - `payload`: builds the provider message for a batch
//! - `dispatcher`: sends every batch concurrently through a [`PushProvider`]
//! - `aggregator`: maps batch outcomes onto devices and merges batches
//!
//! Provider adapters implement [`PushProvider`]; use [`create_push_provider`]
//! to build the configured one.

pub mod aggregator;
pub mod batcher;
mod dispatcher;
mod factory;
mod logging_provider;
pub mod observer;
pub mod payload;
pub mod provider;
mod types;

pub use aggregator::{BatchReport, CallShape};
pub use batcher::slice_devices;
pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, PushDispatcher};
pub use factory::create_push_provider;
pub use logging_provider::LoggingProvider;
pub use observer::{DispatchObserver, TracingObserver};
pub use payload::{expiry_seconds, generate_push_id, BatchPayload};
pub use provider::{
    ProviderCredentials, ProviderError, ProviderLimits, ProviderResponse, PushConfigError,
    PushProvider, DEFAULT_MAX_EXPIRY_SECONDS, DEFAULT_MAX_RECIPIENTS,
};
pub use types::{Device, DispatchOutcome, DispatchResult, NotificationRequest};
pub(crate) use types::deserialize_present;
