//! Shared read models for products and promotions, loaded in batches.

use chrono::Utc;
use sea_orm::{
    prelude::{DateTimeUtc, Decimal},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{product, product_tag, promotion, promotion_product, tag};

#[derive(Clone, Debug, Serialize)]
pub struct TagView {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagView {
    fn from(value: tag::Model) -> Self {
        TagView {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PromotionView {
    pub id: i32,
    pub title: String,
    pub discount_percent: Option<i32>,
    pub description: String,
    pub short_description: String,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub is_active: bool,
    pub is_valid: bool,
}

impl PromotionView {
    pub fn new(value: &promotion::Model, now: DateTimeUtc) -> PromotionView {
        PromotionView {
            id: value.id,
            title: value.title.clone(),
            discount_percent: value.discount_percent,
            description: value.description.clone(),
            short_description: product::short_text(&value.description),
            start_date: value.start_date,
            end_date: value.end_date,
            is_active: value.is_active,
            is_valid: value.is_valid_at(now),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PromotionLinkView {
    pub id: i32,
    pub limit: Option<i32>,
    pub quantity_sold: i32,
    pub price_with_discount: Decimal,
    pub available_for_sale: Option<i32>,
    pub promotion: PromotionView,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub price: Decimal,
    pub count: i32,
    pub description: String,
    pub short_description: String,
    pub available: bool,
    pub quantity_sold: i32,
    pub price_with_promotions: Decimal,
    pub tags: Vec<TagView>,
    pub promotions: Vec<PromotionLinkView>,
}

type PromotionLinks = Vec<(promotion_product::Model, promotion::Model)>;

pub async fn load_promotions<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i32],
) -> Result<HashMap<i32, PromotionLinks>, DbErr> {
    let mut result: HashMap<i32, PromotionLinks> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(result);
    }

    let links = promotion_product::Entity::find()
        .filter(promotion_product::Column::ProductId.is_in(product_ids.to_vec()))
        .order_by_asc(promotion_product::Column::Id)
        .find_also_related(promotion::Entity)
        .all(conn)
        .await?;

    for (link, promo) in links {
        if let Some(promo) = promo {
            result.entry(link.product_id).or_default().push((link, promo));
        }
    }
    Ok(result)
}

pub async fn load_tags<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i32],
) -> Result<HashMap<i32, Vec<tag::Model>>, DbErr> {
    let mut result: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(result);
    }

    let links = product_tag::Entity::find()
        .filter(product_tag::Column::ProductId.is_in(product_ids.to_vec()))
        .find_also_related(tag::Entity)
        .all(conn)
        .await?;

    for (link, tag) in links {
        if let Some(tag) = tag {
            result.entry(link.product_id).or_default().push(tag);
        }
    }
    for tags in result.values_mut() {
        tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(result)
}

/// Promotion-adjusted prices of the given products that still exist.
pub async fn current_prices<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[i32],
) -> Result<HashMap<i32, Decimal>, DbErr> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let now = Utc::now();
    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids.to_vec()))
        .all(conn)
        .await?;
    let promotions = load_promotions(conn, product_ids).await?;

    Ok(products
        .into_iter()
        .map(|prod| {
            let promos: Vec<promotion::Model> = promotions
                .get(&prod.id)
                .map(|links| links.iter().map(|(_, promo)| promo.clone()).collect())
                .unwrap_or_default();
            (prod.id, prod.price_with_promotions(&promos, now))
        })
        .collect())
}

pub async fn price_with_promotions<C: ConnectionTrait>(
    conn: &C,
    prod: &product::Model,
) -> Result<Decimal, DbErr> {
    let prices = current_prices(conn, &[prod.id]).await?;
    Ok(prices.get(&prod.id).copied().unwrap_or(prod.price))
}

/// Full product representations, preserving the order of `products`.
pub async fn product_views<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductView>, DbErr> {
    let now = Utc::now();
    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let mut promotions = load_promotions(conn, &ids).await?;
    let mut tags = load_tags(conn, &ids).await?;

    Ok(products
        .into_iter()
        .map(|prod| {
            let links = promotions.remove(&prod.id).unwrap_or_default();
            let tags = tags.remove(&prod.id).unwrap_or_default();
            build_view(prod, links, tags, now)
        })
        .collect())
}

fn build_view(
    prod: product::Model,
    links: PromotionLinks,
    tags: Vec<tag::Model>,
    now: DateTimeUtc,
) -> ProductView {
    let promos: Vec<promotion::Model> = links.iter().map(|(_, promo)| promo.clone()).collect();
    let price_with_promotions = prod.price_with_promotions(&promos, now);
    let promotions = links
        .into_iter()
        .map(|(link, promo)| PromotionLinkView {
            id: link.id,
            limit: link.limit,
            quantity_sold: link.quantity_sold,
            price_with_discount: promo.apply_discount(prod.price, now),
            available_for_sale: link.available_for_sale(),
            promotion: PromotionView::new(&promo, now),
        })
        .collect();

    ProductView {
        id: prod.id,
        category_id: prod.category_id,
        short_description: prod.short_description(),
        title: prod.title,
        price: prod.price,
        count: prod.count,
        description: prod.description,
        available: prod.available,
        quantity_sold: prod.quantity_sold,
        price_with_promotions,
        tags: tags.into_iter().map(TagView::from).collect(),
        promotions,
    }
}

/// Ids of products linked to a promotion that is valid right now.
pub async fn products_on_promotion<C: ConnectionTrait>(conn: &C) -> Result<Vec<i32>, DbErr> {
    let now = Utc::now();
    let active: Vec<i32> = promotion::Entity::find()
        .filter(promotion::Column::IsActive.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .filter(|promo| promo.is_valid_at(now))
        .map(|promo| promo.id)
        .collect();
    if active.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<i32> = promotion_product::Entity::find()
        .filter(promotion_product::Column::PromotionId.is_in(active))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.product_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Ids of products carrying any of `tag_ids`.
pub async fn products_with_tags<C: ConnectionTrait>(
    conn: &C,
    tag_ids: &[i32],
) -> Result<Vec<i32>, DbErr> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<i32> = product_tag::Entity::find()
        .filter(product_tag::Column::TagId.is_in(tag_ids.to_vec()))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.product_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
