use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{
    prelude::Decimal, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::query::{paginate, Page};
use crate::catalog::{product_views, products_with_tags, ProductView};
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::logging::{to_response, ApiError};

const PRODUCTS_PER_PAGE: u64 = 12;
const RELATED_PRODUCTS: u64 = 4;

pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:id", get(get_product))
        .layer(Extension(db))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let mut half_result = ProductEntity::find();

    if let Some(category_id) = params.category {
        half_result = half_result.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(available) = params.available {
        half_result = half_result.filter(product::Column::Available.eq(available));
    }
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        half_result = half_result.filter(
            Condition::any()
                .add(product::Column::Title.contains(search))
                .add(product::Column::Description.contains(search)),
        );
    }
    if let Some(min) = params.min_price {
        half_result = half_result.filter(product::Column::Price.gte(min));
    }
    if let Some(max) = params.max_price {
        half_result = half_result.filter(product::Column::Price.lte(max));
    }
    if let Some(tag_id) = params.tag {
        let ids = products_with_tags(&txn, &[tag_id]).await?;
        half_result = half_result.filter(product::Column::Id.is_in(ids));
    }

    let page = paginate(
        &txn,
        half_result.order_by_asc(product::Column::Title),
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

async fn get_product(
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

    let related = ProductEntity::find()
        .filter(product::Column::CategoryId.eq(prod.category_id))
        .filter(product::Column::Id.ne(prod.id))
        .order_by_asc(product::Column::Title)
        .limit(RELATED_PRODUCTS)
        .all(&txn)
        .await?;

    let mut views = product_views(&txn, vec![prod]).await?;
    let Some(product) = views.pop() else {
        return Err(ApiError::not_found("product", id));
    };
    let response = ProductDetail {
        product,
        related_products: product_views(&txn, related).await?,
    };

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

#[derive(Deserialize)]
struct GetProductsQuery {
    category: Option<i32>,
    available: Option<bool>,
    search: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    tag: Option<i32>,
    page: Option<u64>,
}

#[derive(Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: ProductView,
    related_products: Vec<ProductView>,
}
