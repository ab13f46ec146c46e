use super::error::HandlerErr;
use crate::config::ServerConfig;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(conn: Connection, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    /// Runs one store call on the blocking pool while holding the connection.
    pub async fn run<T, F>(&self, f: F) -> Result<T, HandlerErr>
    where
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
            f(&conn)
        })
        .await
        .map_err(|e| HandlerErr::internal("worker_failed", e.to_string()))?;
        joined.map_err(HandlerErr::from)
    }
}

/// `Json<T>` whose rejection is reported in the same shape as every other
/// handler error.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HandlerErr;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(v)) => Ok(JsonBody(v)),
            Err(rejection) => Err(HandlerErr {
                status: StatusCode::BAD_REQUEST,
                code: "bad_params",
                message: rejection.body_text(),
                details: Some(json!({ "rejectedWith": rejection.status().as_u16() })),
            }),
        }
    }
}
