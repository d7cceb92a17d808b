use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{patch, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::tag::{self, Entity as TagEntity};
use crate::middleware::logging::{to_response, ApiError};

pub fn admin_tag_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/tag", post(create_tag))
        .route("/tag/:id", patch(patch_tag).delete(delete_tag))
        .layer(Extension(db))
}

async fn create_tag(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<TagPayload>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    ensure_unique_name(&txn, &payload.name, None).await?;

    let now = Utc::now();
    let created = tag::ActiveModel {
        name: Set(payload.name),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "Tag created successfully",
                "id": created.id
            })),
        ),
        Ok(()),
    ))
}

async fn patch_tag(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<TagPayload>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = TagEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("tag", id))?;
    ensure_unique_name(&txn, &payload.name, Some(id)).await?;

    let mut active: tag::ActiveModel = found.into();
    active.name = Set(payload.name);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Tag updated successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn delete_tag(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = TagEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("tag", id))?;
    found.delete(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Tag deleted successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn ensure_unique_name(
    txn: &sea_orm::DatabaseTransaction,
    name: &str,
    except: Option<i32>,
) -> Result<(), ApiError> {
    let mut query = TagEntity::find().filter(tag::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(tag::Column::Id.ne(id));
    }
    match query.one(txn).await? {
        Some(_) => Err(ApiError::Conflict("Tag already exists".to_owned())),
        None => Ok(()),
    }
}

#[derive(Deserialize, Validate)]
struct TagPayload {
    #[validate(length(min = 1, max = 100))]
    name: String,
}
