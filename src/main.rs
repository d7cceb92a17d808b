use sea_orm::Database;
use std::{process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use remi_shop::config::Config;
use remi_shop::create_app;
use remi_shop::entities::{primary_setup, setup_schema};
use remi_shop::session::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    setup_schema(&db).await?;
    primary_setup(&db, &config).await?;

    let sessions = SessionStore::new(config.session_ttl_hours);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let app = create_app(Arc::new(db), Arc::new(config), sessions);
    axum::serve(listener, app).await?;
    Ok(())
}
