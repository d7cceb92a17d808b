use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::promotion;

pub const MAX_DESCRIPTION_LENGTH: usize = 50;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub category_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub count: i32,
    pub available: bool,
    pub quantity_sold: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn short_description(&self) -> String {
        short_text(&self.description)
    }

    /// Price after every linked promotion has been applied in turn.
    pub fn price_with_promotions(&self, promotions: &[promotion::Model], now: DateTimeUtc) -> Decimal {
        promotions
            .iter()
            .fold(self.price, |price, promo| promo.apply_discount(price, now))
    }
}

/// Cuts `text` to the first 50 characters and marks the cut with `...`.
pub fn short_text(text: &str) -> String {
    match text.char_indices().nth(MAX_DESCRIPTION_LENGTH) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_owned(),
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::category::Entity",
        from = "Column::CategoryId",
        to = "crate::entities::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(has_many = "crate::entities::product_tag::Entity")]
    ProductTag,
    #[sea_orm(has_many = "crate::entities::promotion_product::Entity")]
    PromotionProduct,
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<crate::entities::tag::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::product_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::product_tag::Relation::Product.def().rev())
    }
}

impl Related<crate::entities::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::promotion_product::Relation::Promotion.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::promotion_product::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
