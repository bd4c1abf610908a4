use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::{health, prometheus_metrics, send_push, stats};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Push endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/push", post(send_push))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
