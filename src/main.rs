mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

use crate::logging::{attach_tracing_http, init_env_filter, setup_logging};
use anyhow::Context;
use axum::extract::State;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// State shared by every request handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

/// Extractor alias for the application's shared state
pub type AppState = State<Arc<SharedData>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv::dotenv().is_err() {
        println!("Starting server without .env file.");
    }
    setup_logging(init_env_filter());

    let db_url = env::var(app_env::DB_URL).context("DATABASE_URL must be set to start the server")?;
    let db_pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&db_url)
        .await
        .context("connecting to PostgreSQL")?;
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("applying database migrations")?;

    let shared_state = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
    });

    let router = Router::new()
        .merge(api::swagger_main::build_documentation())
        .merge(api::todo::todo_routes())
        .with_state(shared_state);
    let traced_router = attach_tracing_http(router);

    let port = env::var(app_env::SERVER_PORT).unwrap_or("8080".to_owned());
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("binding to port {port}"))?;

    info!("Starting server on port {port}.");
    axum::serve(listener, traced_router)
        .await
        .context("serving the API")?;

    Ok(())
}
