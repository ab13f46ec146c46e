pub mod api;
pub mod config;
pub mod db;
pub mod password;
pub mod store;

pub use api::{build_router, AppState};
pub use config::ServerConfig;
