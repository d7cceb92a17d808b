use axum::{
    extract::Extension, http::StatusCode, response::Response, routing::get, Json, Router,
};
use sea_orm::{
    prelude::{DateTimeUtc, Decimal},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

use crate::entities::{
    basket::{self, Entity as BasketEntity},
    basket_item, user,
};
use crate::middleware::logging::{to_response, ApiError};

pub fn admin_basket_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/basket", get(list_baskets))
        .layer(Extension(db))
}

/// Every persisted basket, i.e. what users left behind at logout.
async fn list_baskets(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let baskets = BasketEntity::find()
        .order_by_desc(basket::Column::UpdatedAt)
        .find_also_related(user::Entity)
        .all(&txn)
        .await?;

    let ids: Vec<i32> = baskets.iter().map(|(b, _)| b.id).collect();
    let mut items: HashMap<i32, Vec<basket_item::Model>> = HashMap::new();
    for item in basket_item::Entity::find()
        .filter(basket_item::Column::BasketId.is_in(ids))
        .order_by_asc(basket_item::Column::Id)
        .all(&txn)
        .await?
    {
        items.entry(item.basket_id).or_default().push(item);
    }

    let response: Vec<AdminBasketResponse> = baskets
        .into_iter()
        .map(|(stored, owner)| {
            let basket_items = items.remove(&stored.id).unwrap_or_default();
            AdminBasketResponse {
                id: stored.id,
                user_id: stored.user_id,
                username: owner.map(|u| u.username),
                created_at: stored.created_at,
                updated_at: stored.updated_at,
                total_cost: basket_items.iter().map(basket_item::Model::total_price).sum(),
                items: basket_items
                    .into_iter()
                    .map(|item| BasketItemResponse {
                        product_id: item.product_id,
                        count: item.count,
                        price: item.price,
                        total_price: item.total_price(),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

#[derive(Serialize)]
struct BasketItemResponse {
    product_id: i32,
    count: i32,
    price: Decimal,
    total_price: Decimal,
}

#[derive(Serialize)]
struct AdminBasketResponse {
    id: i32,
    user_id: i32,
    username: Option<String>,
    created_at: DateTimeUtc,
    updated_at: DateTimeUtc,
    items: Vec<BasketItemResponse>,
    total_cost: Decimal,
}
