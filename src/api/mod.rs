//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod push;
mod routes;

pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use push::{send_push, ExpirationTime, PushRequest, PushResponse};
pub use routes::api_routes;
