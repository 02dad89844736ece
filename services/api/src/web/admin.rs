//! services/api/src/web/admin.rs
//!
//! Administration endpoints: roster edits and the admin password check.

use crate::error::ApiError;
use crate::web::{
    protocol::{
        failure, AddTutorRequest, AdminLoginRequest, AdminLoginResponse, ApiFailure,
        EditTutorRequest, IdRequest, MessageResponse, TutorResponse,
    },
    rest::tutor_id,
    state::AppState,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{error, warn};

//=========================================================================================
// Admin Password
//=========================================================================================

/// Holds an argon2 hash of the configured admin password, if there is one.
#[derive(Clone, Debug, Default)]
pub struct AdminGate {
    password_hash: Option<String>,
}

impl AdminGate {
    /// A gate with no password configured; every login attempt is refused.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Hashes `password` once at startup so the plaintext is not kept around.
    pub fn from_password(password: Option<&str>) -> Result<Self, ApiError> {
        let Some(password) = password else {
            return Ok(Self::disabled());
        };
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Failed to hash admin password: {}", e)))?
            .to_string();
        Ok(Self {
            password_hash: Some(hash),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn verify(&self, attempt: &str) -> bool {
        let Some(hash) = &self.password_hash else {
            return false;
        };
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(attempt.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!("Failed to parse admin password hash: {:?}", e);
                false
            }
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/admin-login - Check the admin password
#[utoipa::path(
    post,
    path = "/api/admin-login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Whether the password matched", body = AdminLoginResponse),
        (status = 500, description = "No admin password configured", body = AdminLoginResponse)
    )
)]
pub async fn admin_login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> (StatusCode, Json<AdminLoginResponse>) {
    if !state.admin.is_configured() {
        warn!("Admin login attempted but no admin password is configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AdminLoginResponse {
                success: false,
                message: Some("Server misconfigured: admin password missing".to_string()),
            }),
        );
    }

    let success = state.admin.verify(&req.password);
    if !success {
        warn!("Rejected admin login");
    }
    (
        StatusCode::OK,
        Json(AdminLoginResponse {
            success,
            message: None,
        }),
    )
}

/// POST /api/toggle-availability - Flip a tutor's availability
#[utoipa::path(
    post,
    path = "/api/toggle-availability",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Availability toggled", body = TutorResponse),
        (status = 404, description = "Tutor not found", body = MessageResponse)
    )
)]
pub async fn toggle_availability_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<TutorResponse>, ApiFailure> {
    let id = tutor_id(req)?;
    let tutor = state
        .roster
        .toggle_availability(&id)
        .await
        .map_err(failure)?;
    Ok(Json(TutorResponse {
        message: "Availability toggled".to_string(),
        tutor: tutor.into(),
    }))
}

/// POST /api/delete-tutor - Remove a tutor from the roster
#[utoipa::path(
    post,
    path = "/api/delete-tutor",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Tutor deleted", body = MessageResponse),
        (status = 404, description = "Tutor not found", body = MessageResponse)
    )
)]
pub async fn delete_tutor_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    let id = tutor_id(req)?;
    state.roster.delete(&id).await.map_err(failure)?;
    Ok(Json(MessageResponse::new("Tutor deleted")))
}

/// POST /api/add-tutor - Add a tutor to the roster
#[utoipa::path(
    post,
    path = "/api/add-tutor",
    request_body = AddTutorRequest,
    responses(
        (status = 200, description = "Tutor added", body = MessageResponse),
        (status = 400, description = "Missing name, id or photo", body = MessageResponse),
        (status = 409, description = "A tutor with this id already exists", body = MessageResponse)
    )
)]
pub async fn add_tutor_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddTutorRequest>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    state.roster.add(req.into()).await.map_err(failure)?;
    Ok(Json(MessageResponse::new("Tutor added")))
}

/// POST /api/edit-tutor - Update some fields of a tutor
#[utoipa::path(
    post,
    path = "/api/edit-tutor",
    request_body = EditTutorRequest,
    responses(
        (status = 200, description = "Tutor updated", body = TutorResponse),
        (status = 404, description = "Tutor not found", body = MessageResponse),
        (status = 409, description = "New id collides with another tutor", body = MessageResponse)
    )
)]
pub async fn edit_tutor_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EditTutorRequest>,
) -> Result<Json<TutorResponse>, ApiFailure> {
    let tutor = state.roster.edit(req.into()).await.map_err(failure)?;
    Ok(Json(TutorResponse {
        message: "Tutor updated".to_string(),
        tutor: tutor.into(),
    }))
}
