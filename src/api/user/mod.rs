pub mod account;
pub mod order;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use account::account_router;
use order::order_router;

pub fn user_api_router(db: Arc<DatabaseConnection>, config: Arc<Config>) -> Router {
    Router::new()
        .merge(account_router(db.clone()))
        .merge(order_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                role: Role::User,
                secret: config.secret.as_str().into(),
            },
            auth_middleware,
        ))
}
