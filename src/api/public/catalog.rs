use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    prelude::{DateTimeUtc, Decimal},
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, Select,
    TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};

use crate::api::query::{normalize_keys, paginate, parse_id_list, parse_ordering, parse_param, Page};
use crate::catalog::{product_views, products_on_promotion, products_with_tags, PromotionView};
use crate::entities::{
    category::{self, Entity as CategoryEntity},
    product::{self, Entity as ProductEntity},
    promotion::{self, Entity as PromotionEntity},
};
use crate::middleware::logging::{to_response, ApiError};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

const PRODUCT_SORT_FIELDS: &[&str] = &["price", "title", "count", "quantity_sold", "created_at"];
const PROMOTION_SORT_FIELDS: &[&str] = &["title", "discount_percent", "start_date", "end_date"];

pub fn catalog_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/catalog/categories", get(get_category_tree))
        .route("/catalog/products", get(get_catalog_products))
        .route("/catalog/promotions", get(get_catalog_promotions))
        .layer(Extension(db))
}

async fn get_category_tree(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let categories = CategoryEntity::find().all(&*db).await?;
    let tree = category::build_tree(&categories);
    Ok(to_response((StatusCode::OK, Json(tree)), Ok(())))
}

async fn get_catalog_products(
    Query(params): Query<HashMap<String, String>>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let params = normalize_keys(params);
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let mut half_result = ProductEntity::find();

    if let Some(title) = text_param(&params, "title") {
        half_result = half_result.filter(product::Column::Title.contains(title));
    }
    if let Some(description) = text_param(&params, "description") {
        half_result = half_result.filter(product::Column::Description.contains(description));
    }
    if let Some(min) = parse_param::<Decimal>(&params, "min_price")? {
        half_result = half_result.filter(product::Column::Price.gte(min));
    }
    if let Some(max) = parse_param::<Decimal>(&params, "max_price")? {
        half_result = half_result.filter(product::Column::Price.lte(max));
    }
    if let Some(min) = parse_param::<i32>(&params, "min_count")? {
        half_result = half_result.filter(product::Column::Count.gte(min));
    }
    if let Some(max) = parse_param::<i32>(&params, "max_count")? {
        half_result = half_result.filter(product::Column::Count.lte(max));
    }
    if let Some(available) = parse_param::<bool>(&params, "available")? {
        half_result = half_result.filter(product::Column::Available.eq(available));
    }
    // false and absent both mean "don't care"
    if parse_param::<bool>(&params, "promotion")? == Some(true) {
        let ids = products_on_promotion(&txn).await?;
        half_result = half_result.filter(product::Column::Id.is_in(ids));
    }
    if let Some(tag_ids) = parse_id_list(&params, "tags")? {
        let ids = products_with_tags(&txn, &tag_ids).await?;
        half_result = half_result.filter(product::Column::Id.is_in(ids));
    }
    if let Some(category_id) = parse_param::<i32>(&params, "category_id")? {
        let categories = CategoryEntity::find().all(&txn).await?;
        let ids = category::descendant_ids(&categories, category_id);
        half_result = half_result.filter(product::Column::CategoryId.is_in(ids));
    }

    let ordering = parse_ordering(
        params.get("sort").map(String::as_str),
        params.get("sort_type").map(String::as_str),
        PRODUCT_SORT_FIELDS,
    );
    let half_result = order_products(half_result, ordering);

    let (page, limit) = page_params(&params)?;
    let page = paginate(&txn, half_result, page, limit).await?;
    let response = Page {
        items: product_views(&txn, page.items).await?,
        current_page: page.current_page,
        last_page: page.last_page,
    };

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn get_catalog_promotions(
    Query(params): Query<HashMap<String, String>>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let params = normalize_keys(params);
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let now = Utc::now();
    let active: Vec<i32> = PromotionEntity::find()
        .filter(promotion::Column::IsActive.eq(true))
        .all(&txn)
        .await?
        .into_iter()
        .filter(|promo| promo.is_valid_at(now))
        .map(|promo| promo.id)
        .collect();

    let mut half_result = PromotionEntity::find().filter(promotion::Column::Id.is_in(active));

    if let Some(title) = text_param(&params, "title") {
        half_result = half_result.filter(promotion::Column::Title.contains(title));
    }
    if let Some(description) = text_param(&params, "description") {
        half_result = half_result.filter(promotion::Column::Description.contains(description));
    }
    if let Some(min) = parse_param::<i32>(&params, "min_discount_percent")? {
        half_result = half_result.filter(promotion::Column::DiscountPercent.gte(min));
    }
    if let Some(max) = parse_param::<i32>(&params, "max_discount_percent")? {
        half_result = half_result.filter(promotion::Column::DiscountPercent.lte(max));
    }
    if let Some(is_active) = parse_param::<bool>(&params, "is_active")? {
        half_result = half_result.filter(promotion::Column::IsActive.eq(is_active));
    }
    if let Some(date) = parse_param::<NaiveDate>(&params, "start_date")? {
        half_result = half_result.filter(promotion::Column::StartDate.gte(day_start(date)));
    }
    if let Some(date) = parse_param::<NaiveDate>(&params, "end_date")? {
        half_result = half_result.filter(promotion::Column::EndDate.lte(day_end(date)));
    }

    let ordering = parse_ordering(
        params.get("sort").map(String::as_str),
        params.get("sort_type").map(String::as_str),
        PROMOTION_SORT_FIELDS,
    );
    for (field, order) in ordering {
        let column = match field.as_str() {
            "title" => promotion::Column::Title,
            "discount_percent" => promotion::Column::DiscountPercent,
            "start_date" => promotion::Column::StartDate,
            _ => promotion::Column::EndDate,
        };
        half_result = half_result.order_by(column, order);
    }
    let half_result = half_result.order_by_asc(promotion::Column::Id);

    let (page, limit) = page_params(&params)?;
    let response = paginate(&txn, half_result, page, limit)
        .await?
        .map(|promo| PromotionView::new(&promo, now));

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

fn order_products(
    mut select: Select<ProductEntity>,
    ordering: Vec<(String, Order)>,
) -> Select<ProductEntity> {
    if ordering.is_empty() {
        select = select.order_by_asc(product::Column::Title);
    }
    for (field, order) in ordering {
        let column = match field.as_str() {
            "price" => product::Column::Price,
            "title" => product::Column::Title,
            "count" => product::Column::Count,
            "quantity_sold" => product::Column::QuantitySold,
            _ => product::Column::CreatedAt,
        };
        select = select.order_by(column, order);
    }
    select.order_by_asc(product::Column::Id)
}

fn text_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn page_params(params: &HashMap<String, String>) -> Result<(Option<u64>, u64), ApiError> {
    let page = parse_param::<u64>(params, "page")?;
    let limit = parse_param::<u64>(params, "limit")?
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    Ok((page, limit))
}

fn day_start(date: NaiveDate) -> DateTimeUtc {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTimeUtc {
    let end = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}
