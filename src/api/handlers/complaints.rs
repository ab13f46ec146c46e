use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::complaints::{self, CreateOutcome, NewComplaint};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

async fn handle_create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewComplaint>,
) -> Result<Response, HandlerErr> {
    let outcome = state.run(move |conn| complaints::create(conn, &body)).await?;
    Ok(match outcome {
        CreateOutcome::Created(c) => ok(c),
        CreateOutcome::SchoolNotFound => message("School not found"),
        CreateOutcome::StudentNotFound => message("Student not found"),
    })
}

async fn handle_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| complaints::list_by_school(conn, &school_id))
        .await?;
    Ok(if list.is_empty() {
        message("No complains found")
    } else {
        ok(list)
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ComplainCreate", post(handle_create))
        .route("/ComplainList/:id", get(handle_list))
}
