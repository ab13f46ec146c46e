use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::teachers::{
    self, AssignOutcome, NewTeacher, RegisterOutcome, SubjectAssignment, TeacherAttendanceEntry,
    TeacherLogin,
};
use crate::store::{DeleteSummary, LoginOutcome};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;

fn deleted(summary: DeleteSummary) -> Response {
    if summary.deleted_count == 0 {
        message("No teachers found to delete")
    } else {
        ok(summary)
    }
}

async fn handle_register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewTeacher>,
) -> Result<Response, HandlerErr> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(HandlerErr::bad_params("email and password must not be empty"));
    }
    let outcome = state.run(move |conn| teachers::register(conn, &body)).await?;
    Ok(match outcome {
        RegisterOutcome::Registered(t) => {
            tracing::info!(teacher_id = %t.id, "teacher registered");
            ok(t)
        }
        RegisterOutcome::DuplicateEmail => message("Email already exists"),
        RegisterOutcome::ClassNotFound => message("Class not found"),
        RegisterOutcome::SubjectNotFound => message("Subject not found"),
    })
}

async fn handle_login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TeacherLogin>,
) -> Result<Response, HandlerErr> {
    let outcome = state.run(move |conn| teachers::login(conn, &body)).await?;
    Ok(match outcome {
        LoginOutcome::LoggedIn(t) => ok(t),
        LoginOutcome::InvalidPassword => message("Invalid password"),
        LoginOutcome::NotFound => message("Teacher not found"),
    })
}

async fn handle_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| teachers::list_by_school(conn, &school_id))
        .await?;
    Ok(if list.is_empty() {
        message("No teachers found")
    } else {
        ok(list)
    })
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let found = state.run(move |conn| teachers::find_teacher(conn, &id)).await?;
    Ok(match found {
        Some(t) => ok(t),
        None => message("No teacher found"),
    })
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| teachers::delete(conn, &id)).await?;
    Ok(match gone {
        Some(t) => ok(t),
        None => message("No teacher found"),
    })
}

async fn handle_delete_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| teachers::delete_by_school(conn, &school_id))
        .await?;
    Ok(deleted(summary))
}

async fn handle_delete_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| teachers::delete_by_class(conn, &class_id))
        .await?;
    Ok(deleted(summary))
}

async fn handle_assign_subject(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SubjectAssignment>,
) -> Result<Response, HandlerErr> {
    let outcome = state
        .run(move |conn| teachers::assign_subject(conn, &body))
        .await?;
    Ok(match outcome {
        AssignOutcome::Assigned(t) => ok(t),
        AssignOutcome::TeacherNotFound => message("Teacher not found"),
        AssignOutcome::SubjectNotFound => message("Subject not found"),
    })
}

async fn handle_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(entry): JsonBody<TeacherAttendanceEntry>,
) -> Result<Response, HandlerErr> {
    let found = state
        .run(move |conn| teachers::record_attendance(conn, &id, &entry))
        .await?;
    Ok(match found {
        Some(t) => ok(t),
        None => message("Teacher not found"),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/TeacherReg", post(handle_register))
        .route("/TeacherLogin", post(handle_login))
        .route(
            "/Teachers/:id",
            get(handle_list).delete(handle_delete_by_school),
        )
        .route("/Teacher/:id", get(handle_detail).delete(handle_delete))
        .route("/TeachersClass/:id", delete(handle_delete_by_class))
        .route("/TeacherSubject", put(handle_assign_subject))
        .route("/TeacherAttendance/:id", post(handle_attendance))
}
