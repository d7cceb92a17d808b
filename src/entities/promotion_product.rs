use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Links a product to a promotion with an optional sale limit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "promotion_product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub promotion_id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    #[sea_orm(column_name = "sale_limit")]
    pub limit: Option<i32>,
    pub quantity_sold: i32,
}

impl Model {
    /// Units still sellable under the limit; `None` means unlimited.
    pub fn available_for_sale(&self) -> Option<i32> {
        self.limit.map(|limit| (limit - self.quantity_sold).max(0))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::promotion::Entity",
        from = "Column::PromotionId",
        to = "crate::entities::promotion::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Promotion,
    #[sea_orm(
        belongs_to = "crate::entities::product::Entity",
        from = "Column::ProductId",
        to = "crate::entities::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<crate::entities::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Promotion.def()
    }
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
