//! Push provider factory

use std::sync::Arc;

use crate::config::PushConfig;

use super::logging_provider::LoggingProvider;
use super::provider::{PushConfigError, PushProvider};

/// Create the push provider adapter selected by configuration.
///
/// Fails when the provider kind is unknown or its credentials or limits are
/// invalid, so a misconfigured service never starts dispatching.
///
/// # Example
///
/// ```rust,ignore
/// let provider = create_push_provider(&settings.push)?;
/// let dispatcher = PushDispatcher::new(provider);
/// ```
pub fn create_push_provider(
    settings: &PushConfig,
) -> Result<Arc<dyn PushProvider>, PushConfigError> {
    match settings.provider.as_str() {
        "log" => {
            let provider = LoggingProvider::new(
                &settings.credentials(),
                settings.platform.clone(),
                settings.limits(),
            )?;
            tracing::info!(
                provider = "log",
                platform = %settings.platform,
                max_recipients = settings.max_recipients,
                "Creating logging push provider"
            );
            Ok(Arc::new(provider))
        }
        other => Err(PushConfigError::UnknownProvider(other.to_string())),
    }
}
