//! services/api/src/web/app.rs
//!
//! Assembles the API router from the handlers. Process-level layers (CORS,
//! static frontend, request tracing) are added by the binary.

use crate::web::{
    admin::{
        add_tutor_handler, admin_login_handler, delete_tutor_handler, edit_tutor_handler,
        toggle_availability_handler,
    },
    photos::photo_handler,
    rest::{heartbeat_handler, list_tutors_handler, login_handler, logout_handler, ApiDoc},
    state::AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// The complete API: tutor routes, admin routes, photos and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Tutor-facing routes
    let tutor_routes = Router::new()
        .route("/api/tutors", get(list_tutors_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/heartbeat", post(heartbeat_handler))
        .route("/photos/{filename}", get(photo_handler));

    // Admin routes
    let admin_routes = Router::new()
        .route("/api/admin-login", post(admin_login_handler))
        .route("/api/toggle-availability", post(toggle_availability_handler))
        .route("/api/delete-tutor", post(delete_tutor_handler))
        .route("/api/add-tutor", post(add_tutor_handler))
        .route("/api/edit-tutor", post(edit_tutor_handler));

    let api_router = Router::new()
        .merge(tutor_routes)
        .merge(admin_routes)
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
