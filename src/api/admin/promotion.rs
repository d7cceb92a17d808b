use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{delete, patch, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    prelude::DateTimeUtc, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::api::double_option;
use crate::entities::{
    product,
    promotion::{self, check_dates, Entity as PromotionEntity},
    promotion_product,
};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn admin_promotion_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/promotion", post(create_promotion))
        .route(
            "/promotion/:id",
            patch(patch_promotion).delete(delete_promotion),
        )
        .route("/promotion/:id/product", post(add_promotion_product))
        .route(
            "/promotion/:id/product/:product_id",
            delete(remove_promotion_product),
        )
        .layer(Extension(db))
}

//ROUTES
async fn create_promotion(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreatePromotion>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let now = Utc::now();
    let created = promotion::ActiveModel {
        title: Set(payload.title),
        description: Set(payload.description.unwrap_or_default()),
        discount_percent: Set(payload.discount_percent),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!(id = created.id, "Created promotion");

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "Promotion created successfully",
                "id": created.id
            })),
        ),
        Ok(()),
    ))
}

async fn patch_promotion(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchPromotion>,
) -> Result<Response, ApiError> {
    payload.validate()?;
    if let Some(Some(percent)) = payload.discount_percent {
        if !(0..=100).contains(&percent) {
            return Err(ApiError::ValidationFail(
                "Discount percent must be between 0 and 100".to_owned(),
            ));
        }
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = PromotionEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("promotion", id))?;

    // the pair is checked after merging with the stored dates
    let start_date = payload.start_date.unwrap_or(found.start_date);
    let end_date = payload.end_date.unwrap_or(found.end_date);
    check_dates(start_date, end_date).map_err(|err| ApiError::ValidationFail(err.to_owned()))?;

    let mut active: promotion::ActiveModel = found.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(discount_percent) = payload.discount_percent {
        active.discount_percent = Set(discount_percent);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.updated_at = Set(Utc::now());

    active.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Promotion updated successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn delete_promotion(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = PromotionEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("promotion", id))?;
    found.delete(&txn).await?;
    txn.commit().await?;
    info!(id, "Deleted promotion");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Promotion deleted successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn add_promotion_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<AddPromotionProduct>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    PromotionEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("promotion", id))?;
    product::Entity::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", payload.product_id))?;

    let existing = promotion_product::Entity::find()
        .filter(promotion_product::Column::PromotionId.eq(id))
        .filter(promotion_product::Column::ProductId.eq(payload.product_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Product is already part of this promotion".to_owned(),
        ));
    }

    let link = promotion_product::ActiveModel {
        promotion_id: Set(id),
        product_id: Set(payload.product_id),
        limit: Set(payload.limit),
        quantity_sold: Set(0),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "Product added to promotion",
                "id": link.id
            })),
        ),
        Ok(()),
    ))
}

async fn remove_promotion_product(
    Path((id, product_id)): Path<(i32, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let result = promotion_product::Entity::delete_many()
        .filter(promotion_product::Column::PromotionId.eq(id))
        .filter(promotion_product::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!(
            "Product {product_id} is not part of promotion {id}."
        )));
    }
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Product removed from promotion"
            })),
        ),
        Ok(()),
    ))
}

fn validate_dates(payload: &CreatePromotion) -> Result<(), ValidationError> {
    check_dates(payload.start_date, payload.end_date)
        .map_err(|msg| ValidationError::new("date_order").with_message(msg.into()))
}

//STRUCTS
#[derive(Deserialize, Validate)]
#[validate(schema(function = "validate_dates"))]
struct CreatePromotion {
    #[validate(length(min = 1, max = 255))]
    title: String,
    description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    discount_percent: Option<i32>,
    start_date: DateTimeUtc,
    end_date: DateTimeUtc,
    is_active: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct PatchPromotion {
    #[validate(length(min = 1, max = 255))]
    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    discount_percent: Option<Option<i32>>,
    start_date: Option<DateTimeUtc>,
    end_date: Option<DateTimeUtc>,
    is_active: Option<bool>,
}

#[derive(Deserialize, Validate)]
struct AddPromotionProduct {
    product_id: i32,
    #[validate(range(min = 0))]
    limit: Option<i32>,
}
