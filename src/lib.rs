// Dispatch core
pub mod push;

// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// HTTP surface
pub mod api;
pub mod server;
