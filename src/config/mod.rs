mod settings;

pub use settings::{ApiConfig, OtelConfig, PushConfig, ServerConfig, Settings};
