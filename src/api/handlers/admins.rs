use crate::api::error::{message, ok, HandlerErr};
use crate::api::types::{AppState, JsonBody};
use crate::store::schools::{self, AdminLogin, AdminPatch, NewAdmin, RegisterOutcome, UpdateOutcome};
use crate::store::LoginOutcome;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

async fn handle_register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewAdmin>,
) -> Result<Response, HandlerErr> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(HandlerErr::bad_params("email and password must not be empty"));
    }
    let outcome = state.run(move |conn| schools::register(conn, &body)).await?;
    Ok(match outcome {
        RegisterOutcome::Registered(admin) => {
            tracing::info!(school_id = %admin.id, "school registered");
            ok(admin)
        }
        RegisterOutcome::DuplicateEmail => message("Email already exists"),
        RegisterOutcome::DuplicateSchoolName => message("School name already exists"),
    })
}

async fn handle_login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AdminLogin>,
) -> Result<Response, HandlerErr> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Ok(message("Email and password are required"));
    }
    let outcome = state.run(move |conn| schools::login(conn, &body)).await?;
    Ok(match outcome {
        LoginOutcome::LoggedIn(admin) => ok(admin),
        LoginOutcome::InvalidPassword => message("Invalid password"),
        LoginOutcome::NotFound => message("User not found"),
    })
}

async fn handle_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let found = state.run(move |conn| schools::find_admin(conn, &id)).await?;
    Ok(match found {
        Some(admin) => ok(admin),
        None => message("No admin found"),
    })
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<AdminPatch>,
) -> Result<Response, HandlerErr> {
    let outcome = state
        .run(move |conn| schools::update(conn, &id, &patch))
        .await?;
    Ok(match outcome {
        UpdateOutcome::Updated(admin) => ok(admin),
        UpdateOutcome::NotFound => message("No admin found"),
        UpdateOutcome::DuplicateEmail => message("Email already exists"),
        UpdateOutcome::DuplicateSchoolName => message("School name already exists"),
    })
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HandlerErr> {
    let gone = state.run(move |conn| schools::delete(conn, &id)).await?;
    Ok(match gone {
        Some(admin) => {
            tracing::info!(school_id = %admin.id, "school deleted with all owned records");
            ok(admin)
        }
        None => message("No admin found"),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/AdminReg", post(handle_register))
        .route("/AdminLogin", post(handle_login))
        .route(
            "/Admin/:id",
            get(handle_detail).put(handle_update).delete(handle_delete),
        )
}
