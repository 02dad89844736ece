//! services/api/src/web/protocol.rs
//!
//! Defines the JSON request and response bodies exchanged between the browser
//! client and the API server, and how core errors map onto HTTP failures.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use tutor_board_core::domain::{split_subjects, NewTutor, TutorEdit, TutorRecord};
use tutor_board_core::ports::PortError;
use utoipa::ToSchema;

//=========================================================================================
// Shared Shapes
//=========================================================================================

/// A tutor as the frontend sees it.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct TutorPayload {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub subjects: Vec<String>,
    pub photo: String,
    pub available: bool,
}

impl From<TutorRecord> for TutorPayload {
    fn from(record: TutorRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            grade: record.grade,
            subjects: record.subjects,
            photo: record.photo,
            available: record.available,
        }
    }
}

/// Subjects may arrive as a list or as one comma-delimited string.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(untagged)]
pub enum SubjectsInput {
    List(Vec<String>),
    Text(String),
}

impl SubjectsInput {
    pub fn into_list(self) -> Vec<String> {
        match self {
            SubjectsInput::List(list) => list,
            SubjectsInput::Text(text) => split_subjects(&text),
        }
    }
}

//=========================================================================================
// Requests
//=========================================================================================

/// A request that names a single tutor. A missing `id` is treated as an unknown tutor.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct IdRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct AddTutorRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub subjects: Option<SubjectsInput>,
}

impl From<AddTutorRequest> for NewTutor {
    fn from(req: AddTutorRequest) -> Self {
        Self {
            name: req.name,
            id: req.id,
            photo: req.photo,
            grade: req.grade,
            subjects: req.subjects.map(SubjectsInput::into_list),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditTutorRequest {
    #[serde(default)]
    pub original_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub subjects: Option<SubjectsInput>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl From<EditTutorRequest> for TutorEdit {
    fn from(req: EditTutorRequest) -> Self {
        Self {
            original_id: req.original_id,
            id: req.id,
            name: req.name,
            grade: req.grade,
            subjects: req.subjects.map(SubjectsInput::into_list),
            photo: req.photo,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub password: String,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct TutorResponse {
    pub message: String,
    pub tutor: TutorPayload,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AdminLoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The error half of every JSON handler.
pub type ApiFailure = (StatusCode, Json<MessageResponse>);

/// Maps a core error onto its HTTP status and a client-facing message.
pub fn failure(err: PortError) -> ApiFailure {
    let (status, message) = match &err {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        PortError::Conflict(why) => (StatusCode::CONFLICT, why.clone()),
        PortError::Validation(why) => (StatusCode::BAD_REQUEST, why.clone()),
        PortError::StoreUnavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Tutor records are unavailable".to_string(),
        ),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    (status, Json(MessageResponse::new(message)))
}
