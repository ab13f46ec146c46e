use crate::api::error::ok;
use crate::api::types::AppState;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

async fn handle_health() -> Response {
    ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(handle_health))
}
