pub mod handlers;
pub mod views;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        // Pages
        .route("/", get(handlers::home))
        .route("/sports", get(handlers::sports_index))
        .route("/sports/", get(handlers::sports_index))
        .route("/sports/history", get(handlers::history))
        .route("/sports/stats", get(handlers::stats))
        // Predictions
        .route("/sports/predict", post(handlers::predict_and_save))
        .route("/api/predict", post(handlers::api_predict))
        .route("/test_api", get(handlers::test_api))
        // Grading and admin
        .route("/sports/result/update", post(handlers::update_result))
        .route("/sports/stats/reset", post(handlers::reset_stats))
        .route("/sports/stats/check-results", post(handlers::check_results))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
