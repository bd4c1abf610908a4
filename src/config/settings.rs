use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::push::{ProviderCredentials, ProviderLimits};
use crate::push::{DEFAULT_MAX_EXPIRY_SECONDS, DEFAULT_MAX_RECIPIENTS};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Provider adapter kind ("log")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Platform tag written onto processed devices
    #[serde(default = "default_platform")]
    pub platform: String,
    pub sender_id: Option<String>,
    pub api_key: Option<String>,
    /// Maximum recipients per provider call
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
    /// Expiry ceiling in seconds
    #[serde(default = "default_max_expiry_seconds")]
    pub max_expiry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_provider() -> String {
    "log".to_string()
}

fn default_platform() -> String {
    "android".to_string()
}

fn default_max_recipients() -> usize {
    DEFAULT_MAX_RECIPIENTS
}

fn default_max_expiry_seconds() -> u64 {
    DEFAULT_MAX_EXPIRY_SECONDS
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "ara-push-dispatcher".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("push.provider", default_provider())?
            .set_default("push.platform", default_platform())?
            .set_default("push.max_recipients", default_max_recipients() as i64)?
            .set_default("push.max_expiry_seconds", default_max_expiry_seconds() as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, PUSH__SENDER_ID, PUSH__API_KEY, OTEL__ENABLED, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PushConfig {
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            sender_id: self.sender_id.clone(),
            api_key: self.api_key.clone(),
        }
    }

    pub fn limits(&self) -> ProviderLimits {
        ProviderLimits {
            max_recipients: self.max_recipients,
            max_expiry_seconds: self.max_expiry_seconds,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            platform: default_platform(),
            sender_id: None,
            api_key: None,
            max_recipients: default_max_recipients(),
            max_expiry_seconds: default_max_expiry_seconds(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
