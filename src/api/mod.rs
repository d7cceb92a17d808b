pub mod admin;
pub mod public;
pub mod query;
pub mod user;

use axum::Router;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::config::Config;
use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>, config: Arc<Config>) -> Router {
    let api = public_api_router(shared_db.clone())
        .merge(user_api_router(shared_db.clone(), config.clone()))
        .nest("/admin", admin_api_router(shared_db, config));

    Router::new().nest("/api", api)
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
/// Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
