use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "promotion")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub discount_percent: Option<i32>,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Active flag set and `now` inside `[start_date, end_date]`.
    pub fn is_valid_at(&self, now: DateTimeUtc) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    pub fn apply_discount(&self, price: Decimal, now: DateTimeUtc) -> Decimal {
        if !self.is_valid_at(now) {
            return price;
        }
        match self.discount_percent {
            Some(percent) if percent > 0 => {
                let discount = price * Decimal::from(percent) / Decimal::from(100);
                (price - discount).round_dp(2)
            }
            _ => price,
        }
    }
}

pub fn check_dates(start_date: DateTimeUtc, end_date: DateTimeUtc) -> Result<(), &'static str> {
    if start_date >= end_date {
        return Err("End date must be later than start date");
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::entities::promotion_product::Entity")]
    PromotionProduct,
}

impl Related<crate::entities::promotion_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionProduct.def()
    }
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::promotion_product::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::promotion_product::Relation::Promotion.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
