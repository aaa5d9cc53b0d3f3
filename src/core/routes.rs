// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_body_bytes;
    let allow_any_origin = state.config.server.allow_any_origin;

    let router = Router::new()
        // Public endpoints
        .route("/register", post(crate::handlers::auth::register_handler))
        .route("/login", post(crate::handlers::auth::login_handler))
        .route("/health", get(crate::handlers::health::health_handler))

        // Token-protected endpoints
        .route("/image/save", post(crate::handlers::images::save_image_handler))
        .route("/image/user/{id}", get(crate::handlers::images::list_images_handler))
        .route("/results/user/{id}", get(crate::handlers::images::list_results_handler))
        .route(
            "/users/{id}",
            get(crate::handlers::users::get_user_handler)
                .put(crate::handlers::users::update_user_handler)
                .delete(crate::handlers::users::delete_user_handler),
        )

        // Admin endpoints
        .route("/users", get(crate::handlers::users::list_users_handler))
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))

        .fallback(crate::handlers::fallback::fallback_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    if allow_any_origin {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
