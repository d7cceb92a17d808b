pub mod basket;
pub mod basket_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_tag;
pub mod promotion;
pub mod promotion_product;
pub mod tag;
pub mod user;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{
    sea_query::{Index, IndexCreateStatement},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Schema,
    Set,
};
use tracing::info;

use crate::config::Config;

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // parents before children so foreign keys resolve on every backend
    let tables = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(tag::Entity),
        schema.create_table_from_entity(product_tag::Entity),
        schema.create_table_from_entity(promotion::Entity),
        schema.create_table_from_entity(promotion_product::Entity),
        schema.create_table_from_entity(basket::Entity),
        schema.create_table_from_entity(basket_item::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    for index in unique_pairs() {
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}

fn unique_pair<E, A, B>(name: &str, entity: E, first: A, second: B) -> IndexCreateStatement
where
    E: EntityTrait,
    A: ColumnTrait,
    B: ColumnTrait,
{
    Index::create()
        .name(name)
        .table(entity)
        .col(first)
        .col(second)
        .unique()
        .if_not_exists()
        .to_owned()
}

fn unique_pairs() -> Vec<IndexCreateStatement> {
    vec![
        unique_pair(
            "uq_product_tag_pair",
            product_tag::Entity,
            product_tag::Column::TagId,
            product_tag::Column::ProductId,
        ),
        unique_pair(
            "uq_promotion_product_pair",
            promotion_product::Entity,
            promotion_product::Column::PromotionId,
            promotion_product::Column::ProductId,
        ),
        unique_pair(
            "uq_basket_item_pair",
            basket_item::Entity,
            basket_item::Column::BasketId,
            basket_item::Column::ProductId,
        ),
        unique_pair(
            "uq_order_item_pair",
            order_item::Entity,
            order_item::Column::OrderId,
            order_item::Column::ProductId,
        ),
    ]
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Creates the configured admin account unless it already exists.
pub async fn primary_setup(db: &DatabaseConnection, config: &Config) -> Result<(), DbErr> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash =
        hash_password(password).map_err(|err| DbErr::Custom(format!("Failed to hash password: {err}")))?;

    let admin = user::ActiveModel {
        username: Set(username.clone()),
        password: Set(password_hash),
        role: Set(user::Role::Admin),
        ..Default::default()
    };
    user::Entity::insert(admin).exec(db).await?;
    info!(username = %username, "Created admin account");

    Ok(())
}
