use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    prelude::{DateTimeUtc, Decimal},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::info;

use crate::api::public::category::PageQuery;
use crate::api::query::{paginate, Page};
use crate::basket::sync::refresh_prices;
use crate::entities::{
    order::{self, Entity as OrderEntity, Status},
    order_item, product,
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};
use crate::session::Session;

const ORDERS_PER_PAGE: u64 = 10;

pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(get_orders))
        .route("/orders/create", post(create_order))
        .route("/orders/:id", get(get_order))
        .layer(Extension(db))
}

async fn get_orders(
    Query(params): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let orders = OrderEntity::find()
        .filter(order::Column::UserId.eq(claims.user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id);
    let page = paginate(&txn, orders, params.page, ORDERS_PER_PAGE).await?;

    let response = Page {
        items: order_responses(&txn, page.items).await?,
        current_page: page.current_page,
        last_page: page.last_page,
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    // someone else's order looks exactly like a missing one
    let found = OrderEntity::find_by_id(id)
        .filter(order::Column::UserId.eq(claims.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("order", id))?;

    let mut responses = order_responses(&txn, vec![found]).await?;
    let response = responses.pop().ok_or_else(|| ApiError::not_found("order", id))?;
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Extension(mut session): Extension<Session>,
) -> Result<Response, ApiError> {
    if session.basket().is_empty() {
        return Ok(basket_is_empty());
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    refresh_prices(&txn, session.basket_mut()).await?;

    let products: HashMap<i32, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(session.basket().product_ids()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|prod| (prod.id, prod))
        .collect();
    if products.is_empty() {
        return Ok(basket_is_empty());
    }

    let now = Utc::now();
    let new_order = order::ActiveModel {
        status: Set(Status::Created),
        user_id: Set(claims.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::new();
    for (product_id, entry) in session.basket().iter() {
        let Some(prod) = products.get(&product_id) else {
            continue;
        };
        items.push(order_item::ActiveModel {
            order_id: Set(new_order.id),
            product_id: Set(product_id),
            count: Set(entry.count),
            price: Set(entry.price),
            ..Default::default()
        });

        let mut sold: product::ActiveModel = prod.clone().into();
        sold.quantity_sold = Set(prod.quantity_sold.saturating_add(entry.count));
        sold.updated_at = Set(now);
        sold.update(&txn).await?;
    }
    order_item::Entity::insert_many(items).exec(&txn).await?;
    txn.commit().await?;

    session.basket_mut().clear();
    session.save();
    info!(user_id = claims.user_id, order_id = new_order.id, "Created order");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Order created successfully",
                "order_id": new_order.id
            })),
        ),
        Ok(()),
    ))
}

fn basket_is_empty() -> Response {
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": "Basket is empty"
            })),
        ),
        Ok(()),
    )
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    product_id: i32,
    title: Option<String>,
    count: i32,
    price: Decimal,
    total_price: Decimal,
}

#[derive(Serialize)]
pub struct OrderResponse {
    id: i32,
    user_id: i32,
    status: Status,
    created_at: DateTimeUtc,
    updated_at: DateTimeUtc,
    items: Vec<OrderItemResponse>,
    total_cost: Decimal,
}

/// Orders with their items and product titles, in the order given.
pub async fn order_responses<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderResponse>, DbErr> {
    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let mut items: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?
    {
        items.entry(item.order_id).or_default().push(item);
    }

    let product_ids: Vec<i32> = items.values().flatten().map(|item| item.product_id).collect();
    let titles: HashMap<i32, String> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|prod| (prod.id, prod.title))
        .collect();

    Ok(orders
        .into_iter()
        .map(|model| {
            let order_items = items.remove(&model.id).unwrap_or_default();
            OrderResponse {
                id: model.id,
                user_id: model.user_id,
                status: model.status,
                created_at: model.created_at,
                updated_at: model.updated_at,
                total_cost: order_item::total_cost(&order_items),
                items: order_items
                    .into_iter()
                    .map(|item| OrderItemResponse {
                        product_id: item.product_id,
                        title: titles.get(&item.product_id).cloned(),
                        count: item.count,
                        total_price: item.total_price(),
                        price: item.price,
                    })
                    .collect(),
            }
        })
        .collect())
}
