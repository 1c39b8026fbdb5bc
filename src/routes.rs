use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        media::media_handler, performance::performance_handler, rating::rating_handler,
        review::review_handler, tracking::tracking_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest(
            "/tracking",
            tracking_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/review", review_handler().layer(middleware::from_fn(auth)))
        .nest("/ratings", rating_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/performance",
            performance_handler().layer(middleware::from_fn(auth)),
        )
        // Transcription callbacks are authenticated by reference, not
        // by a user token.
        .nest("/media", media_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
