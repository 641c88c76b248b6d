//! Axum router construction.
//!
//! Builds the application router with the image routes and the middleware
//! layers (request ID, open CORS, request tracing, body limit).

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    // Any origin, method, and header; preflight requests are answered here.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(ctx.config.server.max_upload_bytes);

    Router::new()
        .route("/images", get(routes::images::list_images))
        .route("/images/upload", post(routes::images::upload_image))
        .route(
            "/images/{id}",
            get(routes::images::get_image)
                .put(routes::images::update_image)
                .delete(routes::images::delete_image),
        )
        .layer(body_limit)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
