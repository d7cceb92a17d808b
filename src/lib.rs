pub mod api;
pub mod basket;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod middleware;
pub mod session;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::config::Config;
use crate::middleware::{logging::logging_middleware, session::session_middleware};
use crate::session::SessionStore;

/// The whole HTTP application; `main` and the integration tests both serve this.
pub fn create_app(db: Arc<DatabaseConnection>, config: Arc<Config>, sessions: SessionStore) -> Router {
    create_api_router(db, config.clone())
        .layer(from_fn_with_state(sessions, session_middleware))
        .layer(Extension(config))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
