pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::markdown::handlers as markdown;
use crate::profile::handlers as profile;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile store
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile)
                .patch(profile::handle_update_profile)
                .delete(profile::handle_clear_profile),
        )
        .route(
            "/api/v1/profile/completeness",
            get(profile::handle_completeness),
        )
        .route("/api/v1/profile/dashboard", get(profile::handle_dashboard))
        .route(
            "/api/v1/profile/sessions",
            post(profile::handle_add_session),
        )
        .route(
            "/api/v1/profile/jobs",
            get(profile::handle_list_jobs).post(profile::handle_add_matched_jobs),
        )
        .route(
            "/api/v1/profile/jobs/apply",
            post(profile::handle_apply_to_job),
        )
        // Feedback rendering
        .route("/api/v1/markdown/render", post(markdown::handle_render))
        .fallback(not_found)
        .with_state(state)
}
