use super::handlers::{admins, classes, complaints, health, notices, students, subjects, teachers};
use super::middleware;
use super::types::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;

pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes;
    Router::new()
        .merge(health::routes())
        .merge(admins::routes())
        .merge(students::routes())
        .merge(teachers::routes())
        .merge(classes::routes())
        .merge(subjects::routes())
        .merge(notices::routes())
        .merge(complaints::routes())
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors,
        ))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .with_state(state)
}
