//! Reconciliation between the session basket and the persisted one.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use std::collections::HashSet;
use tracing::debug;

use super::{BasketEntry, SessionBasket};
use crate::catalog;
use crate::entities::{basket, basket_item, product};

/// Re-prices every entry from the promotions valid now; counts are untouched.
pub async fn refresh_prices<C: ConnectionTrait>(
    conn: &C,
    session_basket: &mut SessionBasket,
) -> Result<(), DbErr> {
    let prices = catalog::current_prices(conn, &session_basket.product_ids()).await?;
    session_basket.apply_prices(&prices);
    Ok(())
}

/// Login: pulls the user's persisted basket into the session.
/// Products already present in the session keep their session entry.
pub async fn sync_from_db<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    session_basket: &mut SessionBasket,
) -> Result<(), DbErr> {
    let Some(stored) = basket::Entity::find()
        .filter(basket::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    else {
        return Ok(());
    };

    let items = basket_item::Entity::find()
        .filter(basket_item::Column::BasketId.eq(stored.id))
        .all(conn)
        .await?;
    debug!(user_id, items = items.len(), "Loading persisted basket");

    session_basket.merge_persisted(items.into_iter().map(|item| {
        (
            item.product_id,
            BasketEntry {
                count: item.count,
                price: item.price,
            },
        )
    }));

    refresh_prices(conn, session_basket).await
}

/// Logout: replaces the user's persisted basket with the session contents.
pub async fn sync_to_db<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    session_basket: &mut SessionBasket,
) -> Result<(), DbErr> {
    let now = Utc::now();
    let stored = match basket::Entity::find()
        .filter(basket::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        Some(stored) => {
            let mut stored: basket::ActiveModel = stored.into();
            stored.updated_at = Set(now);
            stored.update(conn).await?
        }
        None => {
            basket::ActiveModel {
                user_id: Set(user_id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };

    basket_item::Entity::delete_many()
        .filter(basket_item::Column::BasketId.eq(stored.id))
        .exec(conn)
        .await?;

    refresh_prices(conn, session_basket).await?;

    let existing: HashSet<i32> = product::Entity::find()
        .filter(product::Column::Id.is_in(session_basket.product_ids()))
        .all(conn)
        .await?
        .into_iter()
        .map(|prod| prod.id)
        .collect();

    let items: Vec<basket_item::ActiveModel> = session_basket
        .iter()
        .filter(|(product_id, _)| existing.contains(product_id))
        .map(|(product_id, entry)| basket_item::ActiveModel {
            basket_id: Set(stored.id),
            product_id: Set(product_id),
            count: Set(entry.count),
            price: Set(entry.price),
            ..Default::default()
        })
        .collect();
    debug!(user_id, items = items.len(), "Persisting session basket");

    if !items.is_empty() {
        basket_item::Entity::insert_many(items).exec(conn).await?;
    }
    Ok(())
}
