use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::api::query::{paginate, Page};
use crate::catalog::{product_views, ProductView};
use crate::entities::{
    category::{self, Entity as CategoryEntity},
    product,
};
use crate::middleware::logging::{to_response, ApiError};

const CATEGORIES_PER_PAGE: u64 = 20;
const PRODUCTS_PER_PAGE: u64 = 12;

pub fn category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/:id", get(get_category))
        .layer(Extension(db))
}

async fn get_categories(
    Query(params): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let roots = CategoryEntity::find()
        .filter(category::Column::ParentId.is_null())
        .order_by_asc(category::Column::Title);
    let page = paginate(&txn, roots, params.page, CATEGORIES_PER_PAGE).await?;

    let root_ids: Vec<i32> = page.items.iter().map(|c| c.id).collect();
    let mut children: HashMap<i32, Vec<CategorySummary>> = HashMap::new();
    for child in CategoryEntity::find()
        .filter(category::Column::ParentId.is_in(root_ids))
        .order_by_asc(category::Column::Title)
        .all(&txn)
        .await?
    {
        if let Some(parent_id) = child.parent_id {
            children
                .entry(parent_id)
                .or_default()
                .push(CategorySummary::new(child));
        }
    }

    let response = page.map(|root| {
        let subcategories = children.remove(&root.id).unwrap_or_default();
        CategoryWithChildren {
            category: CategorySummary::new(root),
            subcategories,
        }
    });
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn get_category(
    Query(params): Query<PageQuery>,
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

    let subcategories = CategoryEntity::find()
        .filter(category::Column::ParentId.eq(id))
        .order_by_asc(category::Column::Title)
        .all(&txn)
        .await?
        .into_iter()
        .map(CategorySummary::new)
        .collect();

    let products = product::Entity::find()
        .filter(product::Column::CategoryId.eq(id))
        .order_by_asc(product::Column::Title);
    let page = paginate(&txn, products, params.page, PRODUCTS_PER_PAGE).await?;
    let views = product_views(&txn, page.items).await?;

    let response = CategoryDetail {
        category: CategorySummary::new(found),
        subcategories,
        products: Page {
            items: views,
            current_page: page.current_page,
            last_page: page.last_page,
        },
    };
    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

#[derive(Serialize)]
pub struct CategorySummary {
    id: i32,
    title: String,
    parent_id: Option<i32>,
}

impl CategorySummary {
    pub fn new(value: category::Model) -> CategorySummary {
        CategorySummary {
            id: value.id,
            title: value.title,
            parent_id: value.parent_id,
        }
    }
}

#[derive(Serialize)]
struct CategoryWithChildren {
    #[serde(flatten)]
    category: CategorySummary,
    subcategories: Vec<CategorySummary>,
}

#[derive(Serialize)]
struct CategoryDetail {
    category: CategorySummary,
    subcategories: Vec<CategorySummary>,
    products: Page<ProductView>,
}
