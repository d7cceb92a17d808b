use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use super::category::PageQuery;
use crate::api::query::paginate;
use crate::catalog::{product_views, ProductView, PromotionView};
use crate::entities::{
    product,
    promotion::{self, Entity as PromotionEntity},
};
use crate::middleware::logging::{to_response, ApiError};

const PROMOTIONS_PER_PAGE: u64 = 10;

pub fn promotion_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/promotions", get(get_promotions))
        .route("/promotions/:id", get(get_promotion))
        .layer(Extension(db))
}

async fn get_promotions(
    Query(params): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let promotions = PromotionEntity::find()
        .filter(promotion::Column::IsActive.eq(true))
        .order_by_desc(promotion::Column::StartDate)
        .order_by_asc(promotion::Column::Id);
    let now = Utc::now();
    let response = paginate(&txn, promotions, params.page, PROMOTIONS_PER_PAGE)
        .await?
        .map(|promo| PromotionView::new(&promo, now));

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn get_promotion(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let promo = PromotionEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("promotion", id))?;

    let products = promo
        .find_related(product::Entity)
        .order_by_asc(product::Column::Title)
        .all(&txn)
        .await?;

    let response = PromotionDetail {
        promotion: PromotionView::new(&promo, Utc::now()),
        products: product_views(&txn, products).await?,
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

#[derive(Serialize)]
struct PromotionDetail {
    #[serde(flatten)]
    promotion: PromotionView,
    products: Vec<ProductView>,
}
