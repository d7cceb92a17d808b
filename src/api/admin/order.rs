use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::{str::FromStr, sync::Arc};
use tracing::info;

use crate::api::query::{paginate, Page};
use crate::api::user::order::order_responses;
use crate::entities::order::{self, Entity as OrderEntity, Status};
use crate::middleware::logging::{to_response, ApiError};

const ORDERS_PER_PAGE: u64 = 20;

pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/order", get(list_orders))
        .route("/order/:id/status", patch(set_order_status))
        .layer(Extension(db))
}

async fn list_orders(
    Query(params): Query<ListOrdersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let mut half_result = OrderEntity::find();
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        let status = Status::from_str(status).map_err(ApiError::ValidationFail)?;
        half_result = half_result.filter(order::Column::Status.eq(status));
    }

    let page = paginate(
        &txn,
        half_result
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id),
        params.page,
        ORDERS_PER_PAGE,
    )
    .await?;
    let response = Page {
        items: order_responses(&txn, page.items).await?,
        current_page: page.current_page,
        last_page: page.last_page,
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn set_order_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<SetOrderStatus>,
) -> Result<Response, ApiError> {
    let status = Status::from_str(&payload.status).map_err(ApiError::ValidationFail)?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = OrderEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("order", id))?;

    let mut active: order::ActiveModel = found.into();
    match status {
        Status::Paid => active.mark_paid(),
        Status::Completed => active.mark_completed(),
        Status::Cancelled => active.mark_cancelled(),
        Status::Created => active.set_status(Status::Created),
    }
    active.update(&txn).await?;
    txn.commit().await?;
    info!(id, status = %status, "Changed order status");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Order status updated",
                "status": status
            })),
        ),
        Ok(()),
    ))
}

#[derive(Deserialize)]
struct ListOrdersQuery {
    status: Option<String>,
    page: Option<u64>,
}

#[derive(Deserialize)]
struct SetOrderStatus {
    status: String,
}
