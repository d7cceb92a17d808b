pub mod basket;
pub mod category;
pub mod order;
pub mod product;
pub mod promotion;
pub mod tag;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use basket::admin_basket_router;
use category::admin_category_router;
use order::admin_order_router;
use product::admin_product_router;
use promotion::admin_promotion_router;
use tag::admin_tag_router;

use crate::config::Config;
use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};

pub fn admin_api_router(db: Arc<DatabaseConnection>, config: Arc<Config>) -> Router {
    Router::new()
        .merge(admin_category_router(db.clone()))
        .merge(admin_product_router(db.clone()))
        .merge(admin_promotion_router(db.clone()))
        .merge(admin_tag_router(db.clone()))
        .merge(admin_basket_router(db.clone()))
        .merge(admin_order_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db,
                role: Role::Admin,
                secret: config.secret.as_str().into(),
            },
            auth_middleware,
        ))
}
