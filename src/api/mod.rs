//! HTTP surface: one router per collection, merged under shared CORS,
//! body-limit and request-tracing layers.

pub mod error;
pub mod handlers;
mod middleware;
mod router;
pub mod types;

pub use router::build_router;
pub use types::AppState;
