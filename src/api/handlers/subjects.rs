use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::subjects::{self, CreateOutcome, NewSubjects, Subject};
use crate::store::DeleteSummary;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;

fn listed(list: Vec<Subject>) -> Response {
    if list.is_empty() {
        message("No subjects found")
    } else {
        ok(list)
    }
}

fn deleted(summary: DeleteSummary) -> Response {
    if summary.deleted_count == 0 {
        message("No subjects found to delete")
    } else {
        ok(summary)
    }
}

async fn handle_create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewSubjects>,
) -> Result<Response, HandlerErr> {
    if body.subjects.is_empty() {
        return Err(HandlerErr::bad_params("subjects must not be empty"));
    }
    let outcome = state.run(move |conn| subjects::create(conn, &body)).await?;
    Ok(match outcome {
        CreateOutcome::Created(list) => ok(list),
        CreateOutcome::DuplicateCode(code) => {
            tracing::debug!(%code, "subject code already taken");
            message("Sorry this subcode must be unique as it already exists")
        }
        CreateOutcome::ClassNotFound => message("Class not found"),
    })
}

async fn handle_list_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| subjects::list_by_school(conn, &school_id))
        .await?;
    Ok(listed(list))
}

async fn handle_list_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| subjects::list_by_class(conn, &class_id))
        .await?;
    Ok(listed(list))
}

async fn handle_list_free(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| subjects::list_free(conn, &class_id))
        .await?;
    Ok(listed(list))
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let found = state.run(move |conn| subjects::find_subject(conn, &id)).await?;
    Ok(match found {
        Some(s) => ok(s),
        None => message("No subject found"),
    })
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| subjects::delete(conn, &id)).await?;
    Ok(match gone {
        Some(s) => ok(s),
        None => message("No subject found"),
    })
}

async fn handle_delete_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| subjects::delete_by_school(conn, &school_id))
        .await?;
    Ok(deleted(summary))
}

async fn handle_delete_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| subjects::delete_by_class(conn, &class_id))
        .await?;
    Ok(deleted(summary))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/SubjectCreate", post(handle_create))
        .route("/AllSubjects/:id", get(handle_list_by_school))
        .route("/ClassSubjects/:id", get(handle_list_by_class))
        .route("/FreeSubjectList/:id", get(handle_list_free))
        .route("/Subject/:id", get(handle_detail).delete(handle_delete))
        .route("/Subjects/:id", delete(handle_delete_by_school))
        .route("/SubjectsClass/:id", delete(handle_delete_by_class))
}
