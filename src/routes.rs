// routes.rs
use axum::{
    routing::{get, post},
    Router,
};
use http::{header::CONTENT_TYPE, Method};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let api = Router::new()
        .route(
            "/polls",
            get(handlers::list_polls).post(handlers::create_poll),
        )
        .route(
            "/polls/{id}",
            get(handlers::get_poll).put(handlers::edit_poll),
        )
        .route("/polls/{id}/results", get(handlers::get_results))
        .route("/vote", post(handlers::submit_vote));

    Router::new().nest("/api", api).layer(cors).with_state(state)
}
