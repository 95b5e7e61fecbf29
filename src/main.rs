// src/main.rs
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod identity;
mod models;
mod results;
mod routes;
mod state;
mod vote;

use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to the database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = routes::create_routes(AppState::new(pool, config));

    info!("Server running on {addr}");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .expect("Server failed");
}
