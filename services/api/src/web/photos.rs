//! services/api/src/web/photos.rs
//!
//! Serves tutor photos by display name, falling back through looser filenames
//! when the exact one does not exist.

use crate::web::{
    protocol::{failure, ApiFailure, MessageResponse},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

/// GET /photos/{filename} - Resolve and return a tutor photo
#[utoipa::path(
    get,
    path = "/photos/{filename}",
    params(
        ("filename" = String, Path, description = "Requested photo, usually the tutor name plus \".jpeg\". The extension is ignored.")
    ),
    responses(
        (status = 200, description = "The first matching image, served as image/jpeg or image/png"),
        (status = 404, description = "No candidate file exists", body = MessageResponse)
    )
)]
pub async fn photo_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let photo = state
        .photo_resolver
        .fetch(state.photos.as_ref(), &filename)
        .await
        .map_err(failure)?;

    Ok(([(header::CONTENT_TYPE, photo.content_type())], photo.bytes))
}
