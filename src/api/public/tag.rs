use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;

use super::category::PageQuery;
use crate::api::query::{paginate, Page};
use crate::catalog::{product_views, ProductView, TagView};
use crate::entities::{
    product,
    tag::{self, Entity as TagEntity},
};
use crate::middleware::logging::{to_response, ApiError};

const TAGS_PER_PAGE: u64 = 20;
const PRODUCTS_PER_PAGE: u64 = 12;

pub fn tag_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/tags", get(get_tags))
        .route("/tags/:id", get(get_tag))
        .layer(Extension(db))
}

async fn get_tags(
    Query(params): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let tags = TagEntity::find().order_by_asc(tag::Column::Name);
    let response = paginate(&txn, tags, params.page, TAGS_PER_PAGE)
        .await?
        .map(TagView::from);

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn get_tag(
    Query(params): Query<PageQuery>,
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

    let products = found
        .find_related(product::Entity)
        .order_by_asc(product::Column::Title);
    let page = paginate(&txn, products, params.page, PRODUCTS_PER_PAGE).await?;

    let response = TagDetail {
        tag: TagView::from(found),
        products: Page {
            items: product_views(&txn, page.items).await?,
            current_page: page.current_page,
            last_page: page.last_page,
        },
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

#[derive(Serialize)]
struct TagDetail {
    #[serde(flatten)]
    tag: TagView,
    products: Page<ProductView>,
}
