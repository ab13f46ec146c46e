use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::classes::{self, CreateOutcome, NewClass};
use crate::store::students;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;

async fn handle_create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewClass>,
) -> Result<Response, HandlerErr> {
    if body.sclass_name.trim().is_empty() {
        return Err(HandlerErr::bad_params("sclassName must not be empty"));
    }
    let outcome = state.run(move |conn| classes::create(conn, &body)).await?;
    Ok(match outcome {
        CreateOutcome::Created(c) => ok(c),
        CreateOutcome::DuplicateName => message("Sorry this class name already exists"),
        CreateOutcome::SchoolNotFound => message("School not found"),
    })
}

async fn handle_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| classes::list_by_school(conn, &school_id))
        .await?;
    Ok(if list.is_empty() {
        message("No sclasses found")
    } else {
        ok(list)
    })
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let found = state.run(move |conn| classes::find_class(conn, &id)).await?;
    Ok(match found {
        Some(c) => ok(c),
        None => message("No class found"),
    })
}

async fn handle_students(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| students::list_by_class(conn, &class_id))
        .await?;
    Ok(if list.is_empty() {
        message("No employees found")
    } else {
        ok(list)
    })
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| classes::delete(conn, &id)).await?;
    Ok(match gone {
        Some(c) => {
            tracing::info!(class_id = %c.id, "class deleted with its students, subjects and teachers");
            ok(c)
        }
        None => message("Class not found"),
    })
}

async fn handle_delete_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| classes::delete_by_school(conn, &school_id))
        .await?;
    Ok(if summary.deleted_count == 0 {
        message("No classes found to delete")
    } else {
        ok(summary)
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/SclassCreate", post(handle_create))
        .route("/SclassList/:id", get(handle_list))
        .route("/Sclass/:id", get(handle_detail).delete(handle_delete))
        .route("/Sclass/employees/:id", get(handle_students))
        .route("/Sclasses/:id", delete(handle_delete_by_school))
}
