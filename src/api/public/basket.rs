use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{
    prelude::Decimal, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::basket::{SessionBasket, MAX_COUNT};
use crate::catalog::{self, product_views, ProductView};
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::logging::{to_response, ApiError};
use crate::session::Session;

pub fn basket_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/basket", get(get_basket))
        .route("/basket/add/:product_id", post(add_to_basket))
        .route("/basket/update/:product_id", post(update_basket_item))
        .route("/basket/remove/:product_id", post(remove_from_basket))
        .layer(Extension(db))
}

async fn get_basket(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let basket = session.basket();
    let products = ProductEntity::find()
        .filter(product::Column::Id.is_in(basket.product_ids()))
        .all(&txn)
        .await?;

    // entries whose product was deleted are not shown
    let items: Vec<BasketItemResponse> = product_views(&txn, products)
        .await?
        .into_iter()
        .filter_map(|view| {
            let entry = basket.get(view.id)?;
            Some(BasketItemResponse {
                count: entry.count,
                price: entry.price,
                total_price: entry.total_price(),
                product: view,
            })
        })
        .collect();

    let response = BasketResponse {
        total_cost: items.iter().map(|item| item.total_price).sum(),
        basket_count: items.iter().map(|item| i64::from(item.count)).sum(),
        items,
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn add_to_basket(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(mut session): Extension<Session>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let prod = ProductEntity::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", product_id))?;

    if !prod.available {
        return Ok(failure("Product is unavailable"));
    }

    let price = catalog::price_with_promotions(&txn, &prod).await?;
    if !session.basket_mut().add(prod.id, price, 1, false) {
        return Ok(failure("Invalid quantity"));
    }
    session.save();
    debug!(session = session.id(), product_id, "Added product to basket");

    let basket = session.basket();
    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Product \"{}\" added to basket", prod.title),
                "basket_count": basket.len(),
                "total_cost": basket.total_price(),
            })),
        ),
        Ok(()),
    ))
}

async fn update_basket_item(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(mut session): Extension<Session>,
    Json(payload): Json<UpdateBasketItem>,
) -> Result<Response, ApiError> {
    let Some(count) = parse_count(payload.count.as_ref()) else {
        return Ok(failure("Invalid quantity"));
    };

    if count <= 0 {
        drop_entry(session.basket_mut(), product_id);
    } else {
        let txn = db
            .begin()
            .await
            .map_err(|_| ApiError::TransactionCreationFailed)?;
        let prod = ProductEntity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("product", product_id))?;
        let price = catalog::price_with_promotions(&txn, &prod).await?;
        if !session.basket_mut().add(prod.id, price, count, true) {
            return Ok(failure("Invalid quantity"));
        }
    }
    session.save();

    let basket = session.basket();
    let total_price = basket
        .get(product_id)
        .map(|entry| entry.total_price())
        .unwrap_or(Decimal::ZERO);
    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Quantity updated",
                "total_price": total_price,
                "basket_count": basket.len(),
                "total_cost": basket.total_price(),
            })),
        ),
        Ok(()),
    ))
}

async fn remove_from_basket(
    Path(product_id): Path<i32>,
    Extension(mut session): Extension<Session>,
) -> Result<Response, ApiError> {
    drop_entry(session.basket_mut(), product_id);
    session.save();

    let basket = session.basket();
    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product removed from basket",
                "basket_count": basket.len(),
                "total_cost": basket.total_price(),
            })),
        ),
        Ok(()),
    ))
}

fn drop_entry(basket: &mut SessionBasket, product_id: i32) {
    let count = basket.get(product_id).map(|entry| entry.count).unwrap_or(0);
    basket.remove(product_id, count);
}

/// Accepts `3` or `"3"` up to [`MAX_COUNT`]; a missing count means one unit.
fn parse_count(value: Option<&Value>) -> Option<i32> {
    let count = match value {
        None => Some(1),
        Some(Value::Number(number)) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        Some(_) => None,
    };
    count.filter(|count| *count <= MAX_COUNT)
}

fn failure(message: &str) -> Response {
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": message
            })),
        ),
        Ok(()),
    )
}

#[derive(Deserialize)]
struct UpdateBasketItem {
    count: Option<Value>,
}

#[derive(Serialize)]
struct BasketItemResponse {
    product: ProductView,
    count: i32,
    price: Decimal,
    total_price: Decimal,
}

#[derive(Serialize)]
struct BasketResponse {
    items: Vec<BasketItemResponse>,
    total_cost: Decimal,
    basket_count: i64,
}
