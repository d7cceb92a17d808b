use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::{collections::HashSet, sync::Arc};
use tracing::info;
use validator::Validate;

use crate::api::query::{paginate, Page};
use crate::catalog::product_views;
use crate::entities::{
    category,
    product::{self, Entity as ProductEntity},
    product_tag, tag,
};
use crate::middleware::logging::{to_response, ApiError};

const PRODUCTS_PER_PAGE: u64 = 20;

//ROUTERS
pub fn admin_product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/product", get(list_products).post(create_product))
        .route(
            "/product/:id",
            get(admin_get_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/product/:id/tags", put(set_product_tags))
        .layer(Extension(db))
}

//ROUTES
async fn list_products(
    Query(params): Query<ListProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let mut half_result = ProductEntity::find();
    if let Some(min) = params.min_price {
        half_result = half_result.filter(product::Column::Price.gte(min));
    }
    if let Some(max) = params.max_price {
        half_result = half_result.filter(product::Column::Price.lte(max));
    }
    if let Some(query) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        half_result = half_result.filter(product::Column::Title.contains(query));
    }

    let page = paginate(
        &txn,
        half_result.order_by_asc(product::Column::Id),
        params.page,
        PRODUCTS_PER_PAGE,
    )
    .await?;
    let response = Page {
        items: product_views(&txn, page.items).await?,
        current_page: page.current_page,
        last_page: page.last_page,
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn admin_get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let prod = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", id))?;
    let mut views = product_views(&txn, vec![prod]).await?;
    let view = views.pop().ok_or_else(|| ApiError::not_found("product", id))?;

    Ok(to_response((StatusCode::OK, Json(view)), Ok(())))
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateProduct>,
) -> Result<Response, ApiError> {
    payload.validate()?;
    check_price(payload.price)?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    ensure_category(&txn, payload.category_id).await?;

    let now = Utc::now();
    let created = product::ActiveModel {
        category_id: Set(payload.category_id),
        title: Set(payload.title),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(payload.price),
        count: Set(payload.count.unwrap_or(1)),
        available: Set(payload.available.unwrap_or(true)),
        quantity_sold: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(tag_ids) = payload.tag_ids {
        replace_tags(&txn, created.id, &tag_ids).await?;
    }
    txn.commit().await?;
    info!(id = created.id, "Created product");

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "Product created successfully",
                "id": created.id
            })),
        ),
        Ok(()),
    ))
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchProduct>,
) -> Result<Response, ApiError> {
    payload.validate()?;
    if let Some(price) = payload.price {
        check_price(price)?;
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", id))?;
    let mut active: product::ActiveModel = found.into();

    if let Some(category_id) = payload.category_id {
        ensure_category(&txn, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(count) = payload.count {
        active.count = Set(count);
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now());

    active.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Product updated successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let found = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", id))?;
    found.delete(&txn).await?;
    txn.commit().await?;
    info!(id, "Deleted product");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Product deleted successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn set_product_tags(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<SetProductTags>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("product", id))?;
    replace_tags(&txn, id, &payload.tag_ids).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Product tags updated successfully"
            })),
        ),
        Ok(()),
    ))
}

fn check_price(price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::ValidationFail("Price must not be negative".to_owned()));
    }
    Ok(())
}

async fn ensure_category(txn: &DatabaseTransaction, id: i32) -> Result<(), ApiError> {
    category::Entity::find_by_id(id)
        .one(txn)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("category", id))
}

/// The product ends up carrying exactly `tag_ids`.
async fn replace_tags(txn: &DatabaseTransaction, product_id: i32, tag_ids: &[i32]) -> Result<(), ApiError> {
    let wanted: HashSet<i32> = tag_ids.iter().copied().collect();
    let found: HashSet<i32> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(wanted.iter().copied()))
        .all(txn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    if let Some(missing) = wanted.difference(&found).min() {
        return Err(ApiError::not_found("tag", *missing));
    }

    product_tag::Entity::delete_many()
        .filter(product_tag::Column::ProductId.eq(product_id))
        .exec(txn)
        .await?;

    let links: Vec<product_tag::ActiveModel> = found
        .into_iter()
        .map(|tag_id| product_tag::ActiveModel {
            tag_id: Set(tag_id),
            product_id: Set(product_id),
            ..Default::default()
        })
        .collect();
    if !links.is_empty() {
        product_tag::Entity::insert_many(links).exec(txn).await?;
    }
    Ok(())
}

//STRUCTS
#[derive(Deserialize)]
struct ListProductsQuery {
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    query: Option<String>,
    page: Option<u64>,
}

#[derive(Deserialize, Validate)]
struct CreateProduct {
    category_id: i32,
    #[validate(length(min = 1, max = 100))]
    title: String,
    description: Option<String>,
    price: Decimal,
    #[validate(range(min = 0))]
    count: Option<i32>,
    available: Option<bool>,
    tag_ids: Option<Vec<i32>>,
}

#[derive(Deserialize, Validate)]
struct PatchProduct {
    category_id: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    title: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    #[validate(range(min = 0))]
    count: Option<i32>,
    available: Option<bool>,
}

#[derive(Deserialize)]
struct SetProductTags {
    tag_ids: Vec<i32>,
}
