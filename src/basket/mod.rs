//! Session basket: product id → {count, price snapshot}.
//!
//! Prices are captured when a product first enters the basket and only move
//! on an explicit refresh (see [`sync::refresh_prices`]).

pub mod sync;

use sea_orm::prelude::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Largest quantity a single entry may hold.
pub const MAX_COUNT: i32 = 32767;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasketEntry {
    pub count: i32,
    pub price: Decimal,
}

impl BasketEntry {
    pub fn total_price(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionBasket {
    items: BTreeMap<String, BasketEntry>,
}

impl SessionBasket {
    /// Adds `count` units, or sets the count to `count` when `update_count`.
    /// `price` is only recorded for products not yet in the basket.
    /// Returns false and leaves the basket unchanged when the resulting count
    /// would fall outside `0..=MAX_COUNT`.
    pub fn add(&mut self, product_id: i32, price: Decimal, count: i32, update_count: bool) -> bool {
        let current = self.get(product_id).map_or(0, |entry| entry.count);
        let target = if update_count {
            Some(count)
        } else {
            current.checked_add(count)
        };
        match target {
            Some(target) if (0..=MAX_COUNT).contains(&target) => {
                self.items
                    .entry(product_id.to_string())
                    .or_insert(BasketEntry { count: 0, price })
                    .count = target;
                true
            }
            _ => false,
        }
    }

    /// Drops the entry when `count` covers it, otherwise decrements.
    /// Returns false when the product was not in the basket.
    pub fn remove(&mut self, product_id: i32, count: i32) -> bool {
        let key = product_id.to_string();
        let Some(entry) = self.items.get_mut(&key) else {
            return false;
        };
        if count >= entry.count {
            self.items.remove(&key);
        } else if count > 0 {
            entry.count -= count;
        }
        true
    }

    pub fn get(&self, product_id: i32) -> Option<&BasketEntry> {
        self.items.get(&product_id.to_string())
    }

    pub fn contains(&self, product_id: i32) -> bool {
        self.items.contains_key(&product_id.to_string())
    }

    /// Number of units across all entries.
    pub fn len(&self) -> i64 {
        self.items.values().map(|item| i64::from(item.count)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_price(&self) -> Decimal {
        self.items.values().map(BasketEntry::total_price).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn product_ids(&self) -> Vec<i32> {
        self.items.keys().filter_map(|key| key.parse().ok()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &BasketEntry)> {
        self.items
            .iter()
            .filter_map(|(key, entry)| key.parse().ok().map(|id| (id, entry)))
    }

    /// Overwrites prices with `prices`; products missing from it keep theirs.
    pub fn apply_prices(&mut self, prices: &HashMap<i32, Decimal>) {
        for (key, entry) in self.items.iter_mut() {
            let price = key.parse::<i32>().ok().and_then(|id| prices.get(&id));
            if let Some(price) = price {
                entry.price = *price;
            }
        }
    }

    /// Copies persisted entries in; products already in the session win.
    pub fn merge_persisted<I>(&mut self, persisted: I)
    where
        I: IntoIterator<Item = (i32, BasketEntry)>,
    {
        for (product_id, entry) in persisted {
            self.items.entry(product_id.to_string()).or_insert(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn adding_twice_increments_single_entry() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(100), 1, false);
        basket.add(5, dec(100), 1, false);

        assert_eq!(basket.product_ids(), vec![5]);
        assert_eq!(basket.get(5).unwrap().count, 2);
        assert_eq!(basket.len(), 2);
    }

    #[test]
    fn update_count_overwrites() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(100), 3, false);
        basket.add(5, dec(100), 7, true);
        assert_eq!(basket.get(5).unwrap().count, 7);
    }

    #[test]
    fn existing_entry_keeps_captured_price() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(100), 1, false);
        basket.add(5, dec(80), 1, false);
        assert_eq!(basket.get(5).unwrap().price, dec(100));
    }

    #[test]
    fn remove_with_matching_count_deletes() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(10), 2, false);
        assert!(basket.remove(5, 2));
        assert!(!basket.contains(5));
    }

    #[test]
    fn remove_with_smaller_count_decrements() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(10), 3, false);
        basket.remove(5, 1);
        assert_eq!(basket.get(5).unwrap().count, 2);
    }

    #[test]
    fn remove_of_absent_product_is_noop() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(10), 3, false);
        assert!(!basket.remove(6, 1));
        assert_eq!(basket.len(), 3);
    }

    #[test]
    fn counts_are_bounded() {
        let mut basket = SessionBasket::default();
        assert!(basket.add(1, dec(1), MAX_COUNT, true));
        assert!(!basket.add(1, dec(1), 1, false));
        assert!(!basket.add(2, dec(1), MAX_COUNT + 1, true));
        assert!(!basket.add(1, dec(1), i32::MAX, false));
        assert!(!basket.contains(2));
        assert_eq!(basket.get(1).unwrap().count, MAX_COUNT);

        assert!(basket.add(2, dec(1), MAX_COUNT, true));
        assert_eq!(basket.len(), 2 * i64::from(MAX_COUNT));
    }

    #[test]
    fn negative_remove_leaves_entry() {
        let mut basket = SessionBasket::default();
        basket.add(5, dec(10), 3, false);
        assert!(basket.remove(5, -4));
        assert_eq!(basket.get(5).unwrap().count, 3);
    }

    #[test]
    fn totals_follow_counts_and_prices() {
        let mut basket = SessionBasket::default();
        basket.add(1, Decimal::new(1050, 2), 2, false);
        basket.add(2, dec(3), 1, false);
        assert_eq!(basket.total_price(), dec(24));
        assert_eq!(basket.len(), 3);
    }

    #[test]
    fn apply_prices_changes_price_not_count() {
        let mut basket = SessionBasket::default();
        basket.add(1, dec(100), 4, false);
        basket.add(2, dec(50), 1, false);

        let prices = HashMap::from([(1, dec(90))]);
        basket.apply_prices(&prices);

        assert_eq!(basket.get(1).unwrap(), &BasketEntry { count: 4, price: dec(90) });
        assert_eq!(basket.get(2).unwrap(), &BasketEntry { count: 1, price: dec(50) });
    }

    #[test]
    fn merge_keeps_session_entries() {
        let mut basket = SessionBasket::default();
        basket.add(1, dec(100), 1, false);

        basket.merge_persisted(vec![
            (1, BasketEntry { count: 5, price: dec(70) }),
            (2, BasketEntry { count: 2, price: dec(20) }),
        ]);

        assert_eq!(basket.get(1).unwrap(), &BasketEntry { count: 1, price: dec(100) });
        assert_eq!(basket.get(2).unwrap(), &BasketEntry { count: 2, price: dec(20) });
    }

    #[test]
    fn serializes_as_string_keyed_map_with_string_prices() {
        let mut basket = SessionBasket::default();
        basket.add(12, Decimal::new(1999, 2), 1, false);
        let value = serde_json::to_value(&basket).unwrap();
        assert_eq!(value["12"]["count"], 1);
        assert_eq!(value["12"]["price"], "19.99");
    }
}
