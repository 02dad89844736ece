//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the tutor-facing REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    admin,
    photos,
    protocol::{
        failure, AddTutorRequest, AdminLoginRequest, AdminLoginResponse, ApiFailure,
        EditTutorRequest, IdRequest, MessageResponse, StatusResponse, SubjectsInput,
        TutorPayload, TutorResponse,
    },
    state::AppState,
};
use axum::{extract::State, response::Json};
use chrono::Utc;
use std::sync::Arc;
use tutor_board_core::ports::PortError;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_tutors_handler,
        login_handler,
        logout_handler,
        heartbeat_handler,
        admin::toggle_availability_handler,
        admin::delete_tutor_handler,
        admin::add_tutor_handler,
        admin::edit_tutor_handler,
        admin::admin_login_handler,
        photos::photo_handler,
    ),
    components(
        schemas(
            TutorPayload, SubjectsInput, IdRequest, AddTutorRequest, EditTutorRequest,
            AdminLoginRequest, MessageResponse, TutorResponse, StatusResponse,
            AdminLoginResponse
        )
    ),
    tags(
        (name = "Tutor Board API", description = "Tutor availability, presence heartbeats and roster administration.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /api/tutors - List every tutor with their current availability
#[utoipa::path(
    get,
    path = "/api/tutors",
    responses(
        (status = 200, description = "All tutors", body = [TutorPayload])
    )
)]
pub async fn list_tutors_handler(State(state): State<Arc<AppState>>) -> Json<Vec<TutorPayload>> {
    let tutors = state.roster.list().await;
    Json(tutors.into_iter().map(TutorPayload::from).collect())
}

/// POST /api/login - Mark a tutor available and start tracking their heartbeats
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Logged in", body = TutorResponse),
        (status = 404, description = "Tutor not found", body = MessageResponse),
        (status = 500, description = "Tutor records unavailable", body = MessageResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<TutorResponse>, ApiFailure> {
    let id = tutor_id(req)?;
    let tutor = state.roster.login(&id, Utc::now()).await.map_err(failure)?;
    Ok(Json(TutorResponse {
        message: "Logged in".to_string(),
        tutor: tutor.into(),
    }))
}

/// POST /api/logout - Mark a tutor unavailable and stop tracking their heartbeats
#[utoipa::path(
    post,
    path = "/api/logout",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Logged out", body = TutorResponse),
        (status = 404, description = "Tutor not found", body = MessageResponse),
        (status = 500, description = "Tutor records unavailable", body = MessageResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<TutorResponse>, ApiFailure> {
    let id = tutor_id(req)?;
    let tutor = state.roster.logout(&id).await.map_err(failure)?;
    Ok(Json(TutorResponse {
        message: "Logged out".to_string(),
        tutor: tutor.into(),
    }))
}

/// POST /api/heartbeat - Keep a logged-in tutor's presence fresh, always acknowledged
#[utoipa::path(
    post,
    path = "/api/heartbeat",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Acknowledged", body = StatusResponse)
    )
)]
pub async fn heartbeat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Json<StatusResponse> {
    state
        .roster
        .heartbeat(req.id.as_deref().map(str::trim), Utc::now())
        .await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// The trimmed tutor id of a request, or a not-found failure when it is blank.
pub(crate) fn tutor_id(req: IdRequest) -> Result<String, ApiFailure> {
    req.id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| failure(PortError::NotFound("Tutor".to_string())))
}
