use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::students::{
    self, AttendanceEntry, AttendanceOutcome, ExamEntry, ExamOutcome, NewStudent, RegisterOutcome,
    StudentLogin, StudentPatch, UpdateOutcome,
};
use crate::store::{DeleteSummary, LoginOutcome, UpdateSummary};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;

const NOT_FOUND: &str = "employee not found";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectOnly {
    sub_id: String,
}

fn deleted(summary: DeleteSummary) -> Response {
    if summary.deleted_count == 0 {
        message("No employees found to delete")
    } else {
        ok(summary)
    }
}

fn cleared(summary: UpdateSummary) -> Response {
    if summary.modified_count == 0 {
        message("No attendance records found to clear")
    } else {
        ok(summary)
    }
}

async fn handle_register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewStudent>,
) -> Result<Response, HandlerErr> {
    if body.name.trim().is_empty() || body.password.is_empty() {
        return Err(HandlerErr::bad_params("name and password must not be empty"));
    }
    let outcome = state.run(move |conn| students::register(conn, &body)).await?;
    Ok(match outcome {
        RegisterOutcome::Registered(s) => {
            tracing::info!(student_id = %s.id, "student registered");
            ok(s)
        }
        RegisterOutcome::DuplicateRollNum => message("Roll Number already exists"),
        RegisterOutcome::ClassNotFound => message("Class not found"),
    })
}

async fn handle_login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StudentLogin>,
) -> Result<Response, HandlerErr> {
    let outcome = state.run(move |conn| students::login(conn, &body)).await?;
    Ok(match outcome {
        LoginOutcome::LoggedIn(s) => ok(s),
        LoginOutcome::InvalidPassword => message("Invalid password"),
        LoginOutcome::NotFound => message(NOT_FOUND),
    })
}

async fn handle_list(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let list = state
        .run(move |conn| students::list_by_school(conn, &school_id))
        .await?;
    Ok(if list.is_empty() {
        message("No employees found")
    } else {
        ok(list)
    })
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let found = state
        .run(move |conn| students::find_student(conn, &id, true))
        .await?;
    Ok(match found {
        Some(s) => ok(s),
        None => message("No employee found"),
    })
}

async fn handle_delete_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::delete_by_school(conn, &school_id))
        .await?;
    Ok(deleted(summary))
}

async fn handle_delete_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::delete_by_class(conn, &class_id))
        .await?;
    Ok(deleted(summary))
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| students::delete(conn, &id)).await?;
    Ok(match gone {
        Some(s) => ok(s),
        None => message("No employee found"),
    })
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<StudentPatch>,
) -> Result<Response, HandlerErr> {
    let outcome = state
        .run(move |conn| students::update(conn, &id, &patch))
        .await?;
    Ok(match outcome {
        UpdateOutcome::Updated(s) => ok(s),
        UpdateOutcome::StudentNotFound => message(NOT_FOUND),
        UpdateOutcome::ClassNotFound => message("Class not found"),
        UpdateOutcome::DuplicateRollNum => message("Roll Number already exists"),
    })
}

async fn handle_exam_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(entry): JsonBody<ExamEntry>,
) -> Result<Response, HandlerErr> {
    let outcome = state
        .run(move |conn| students::upsert_exam_result(conn, &id, &entry))
        .await?;
    Ok(match outcome {
        ExamOutcome::Updated(s) => ok(s),
        ExamOutcome::StudentNotFound => message(NOT_FOUND),
        ExamOutcome::SubjectNotFound => message("Subject not found"),
    })
}

async fn handle_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(entry): JsonBody<AttendanceEntry>,
) -> Result<Response, HandlerErr> {
    let outcome = state
        .run(move |conn| students::record_attendance(conn, &id, &entry))
        .await?;
    Ok(match outcome {
        AttendanceOutcome::Recorded(s) => ok(s),
        AttendanceOutcome::LimitReached => message("Maximum attendance limit reached"),
        AttendanceOutcome::StudentNotFound => message(NOT_FOUND),
        AttendanceOutcome::SubjectNotFound => message("Subject not found"),
    })
}

async fn handle_clear_subject_all(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::clear_subject_attendance(conn, &subject_id))
        .await?;
    Ok(cleared(summary))
}

async fn handle_clear_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::clear_school_attendance(conn, &school_id))
        .await?;
    Ok(cleared(summary))
}

async fn handle_clear_student_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SubjectOnly>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::clear_student_subject_attendance(conn, &id, &body.sub_id))
        .await?;
    Ok(cleared(summary))
}

async fn handle_clear_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let summary = state
        .run(move |conn| students::clear_student_attendance(conn, &id))
        .await?;
    Ok(cleared(summary))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employeeReg", post(handle_register))
        .route("/employeeLogin", post(handle_login))
        .route(
            "/employees/:id",
            get(handle_list).delete(handle_delete_by_school),
        )
        .route(
            "/employee/:id",
            get(handle_detail).delete(handle_delete).put(handle_update),
        )
        .route("/employeesClass/:id", delete(handle_delete_by_class))
        .route("/UpdateExamResult/:id", put(handle_exam_result))
        .route("/employeeAttendance/:id", put(handle_attendance))
        .route(
            "/RemoveAllemployeesSubAtten/:id",
            put(handle_clear_subject_all),
        )
        .route("/RemoveAllemployeesAtten/:id", put(handle_clear_school))
        .route(
            "/RemoveemployeeSubAtten/:id",
            put(handle_clear_student_subject),
        )
        .route("/RemoveemployeeAtten/:id", put(handle_clear_student))
}
