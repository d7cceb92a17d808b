pub mod auth;
pub mod basket;
pub mod catalog;
pub mod category;
pub mod product;
pub mod promotion;
pub mod tag;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use auth::auth_router;
use basket::basket_router;
use catalog::catalog_router;
use category::category_router;
use product::product_router;
use promotion::promotion_router;
use tag::tag_router;

pub fn public_api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(auth_router(db.clone()))
        .merge(category_router(db.clone()))
        .merge(product_router(db.clone()))
        .merge(promotion_router(db.clone()))
        .merge(tag_router(db.clone()))
        .merge(catalog_router(db.clone()))
        .merge(basket_router(db))
}
