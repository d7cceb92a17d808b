use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{patch, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, ModelTrait, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::api::double_option;
use crate::entities::category::{self, Entity as CategoryEntity};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn admin_category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/category", post(create_category))
        .route("/category/:id", patch(patch_category).delete(delete_category))
        .layer(Extension(db))
}

//ROUTES
async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCategory>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    if let Some(parent_id) = payload.parent_id {
        ensure_exists(&txn, parent_id).await?;
    }

    let now = Utc::now();
    let created = category::ActiveModel {
        title: Set(payload.title),
        parent_id: Set(payload.parent_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    info!(id = created.id, "Created category");

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "Category created successfully",
                "id": created.id
            })),
        ),
        Ok(()),
    ))
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCategory>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = CategoryEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("category", id))?;
    let mut active: category::ActiveModel = found.into();

    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(parent_id) = payload.parent_id {
        if let Some(parent_id) = parent_id {
            ensure_exists(&txn, parent_id).await?;
            let categories = CategoryEntity::find().all(&txn).await?;
            if category::descendant_ids(&categories, id).contains(&parent_id) {
                return Err(ApiError::ValidationFail(
                    "A category cannot be moved under itself or its subcategories".to_owned(),
                ));
            }
        }
        active.parent_id = Set(parent_id);
    }
    active.updated_at = Set(Utc::now());

    active.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Category updated successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = CategoryEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("category", id))?;
    found.delete(&txn).await?;
    txn.commit().await?;
    info!(id, "Deleted category");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Category deleted successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn ensure_exists(txn: &DatabaseTransaction, id: i32) -> Result<(), ApiError> {
    CategoryEntity::find_by_id(id)
        .one(txn)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("category", id))
}

//STRUCTS
#[derive(Deserialize, Validate)]
struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    title: String,
    parent_id: Option<i32>,
}

#[derive(Deserialize, Validate)]
struct PatchCategory {
    #[validate(length(min = 1, max = 100))]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    parent_id: Option<Option<i32>>,
}
