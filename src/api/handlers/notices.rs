use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::notices::{self, NewNotice, NoticePatch};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;

async fn handle_create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewNotice>,
) -> Result<Response, HandlerErr> {
    let created = state.run(move |conn| notices::create(conn, &body)).await?;
    Ok(match created {
        Some(n) => ok(n),
        None => message("School not found"),
    })
}

async fn handle_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| notices::list_by_school(conn, &school_id))
        .await?;
    Ok(if list.is_empty() {
        message("No notices found")
    } else {
        ok(list)
    })
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<NoticePatch>,
) -> Result<Response, HandlerErr> {
    let updated = state
        .run(move |conn| notices::update(conn, &id, &patch))
        .await?;
    Ok(match updated {
        Some(n) => ok(n),
        None => message("Notice not found"),
    })
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| notices::delete(conn, &id)).await?;
    Ok(match gone {
        Some(n) => ok(n),
        None => message("Notice not found"),
    })
}

async fn handle_delete_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| notices::delete_by_school(conn, &school_id))
        .await?;
    Ok(if summary.deleted_count == 0 {
        message("No notices found to delete")
    } else {
        ok(summary)
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/NoticeCreate", post(handle_create))
        .route("/NoticeList/:id", get(handle_list))
        .route("/Notices/:id", delete(handle_delete_by_school))
        .route("/Notice/:id", put(handle_update).delete(handle_delete))
}
