use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;
use crate::push::{create_push_provider, PushDispatcher};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<PushDispatcher>,
}

impl AppState {
    pub fn new(settings: Settings, dispatcher: PushDispatcher) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Build the configured provider and a dispatcher over it
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let provider = create_push_provider(&settings.push)?;
        Ok(Self::new(settings, PushDispatcher::new(provider)))
    }
}
