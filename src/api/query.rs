//! Query-string helpers shared by list endpoints.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::Serialize;
use std::collections::HashMap;

use crate::middleware::logging::ApiError;

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel case regex"));

pub fn camel_to_snake(name: &str) -> String {
    CAMEL_BOUNDARY.replace_all(name, "${1}_${2}").to_lowercase()
}

/// Raw query parameters with camelCase keys folded to snake_case.
pub fn normalize_keys(params: HashMap<String, String>) -> HashMap<String, String> {
    params
        .into_iter()
        .map(|(key, value)| (camel_to_snake(&key), value))
        .collect()
}

/// Parses `params[name]`; blank values count as absent.
pub fn parse_param<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ApiError> {
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::ValidationFail(format!("Invalid value for {name}: {value}"))),
        None => Ok(None),
    }
}

pub fn parse_id_list(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(raw) = params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| ApiError::ValidationFail(format!("Invalid value for {name}: {raw}")))
        })
        .collect::<Result<Vec<i32>, ApiError>>()
        .map(Some)
}

/// `sort=a,b` with `sortType=des` (all fields) or `sortType=asc,des` (per field).
/// Unknown fields are dropped; an empty result means "use the default".
pub fn parse_ordering(
    sort: Option<&str>,
    sort_type: Option<&str>,
    allowed: &[&str],
) -> Vec<(String, sea_orm::Order)> {
    let Some(sort) = sort else {
        return Vec::new();
    };
    let fields: Vec<String> = sort
        .split(',')
        .map(|field| camel_to_snake(field.trim()))
        .filter(|field| allowed.contains(&field.as_str()))
        .collect();

    let types: Vec<&str> = sort_type
        .map(|raw| raw.split(',').map(str::trim).collect())
        .unwrap_or_default();

    let direction = |kind: &str| match kind {
        "des" => sea_orm::Order::Desc,
        _ => sea_orm::Order::Asc,
    };

    let paired = types.len() == fields.len();
    fields
        .into_iter()
        .enumerate()
        .map(|(idx, field)| {
            let order = if types.len() == 1 {
                direction(types[0])
            } else if paired {
                direction(types[idx])
            } else {
                sea_orm::Order::Asc
            };
            (field, order)
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }
}

/// Keeps `page` inside `[1, last_page]`; `last_page` is at least 1.
pub fn clamp_page(page: Option<u64>, num_pages: u64) -> (u64, u64) {
    let last_page = num_pages.max(1);
    let page = page.unwrap_or(1).clamp(1, last_page);
    (page, last_page)
}

pub async fn paginate<'db, C, E, M>(
    conn: &'db C,
    select: Select<E>,
    page: Option<u64>,
    page_size: u64,
) -> Result<Page<M>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync + 'db,
{
    let paginator = select.paginate(conn, page_size.max(1));
    let (current_page, last_page) = clamp_page(page, paginator.num_pages().await?);
    let items = paginator.fetch_page(current_page - 1).await?;

    Ok(Page {
        items,
        current_page,
        last_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Order;

    #[test]
    fn camel_case_keys_become_snake_case() {
        assert_eq!(camel_to_snake("minPrice"), "min_price");
        assert_eq!(camel_to_snake("categoryId"), "category_id");
        assert_eq!(camel_to_snake("min_price"), "min_price");
        assert_eq!(camel_to_snake("title"), "title");
    }

    #[test]
    fn normalize_keeps_values() {
        let params = HashMap::from([("maxDiscountPercent".to_owned(), "30".to_owned())]);
        let params = normalize_keys(params);
        assert_eq!(params.get("max_discount_percent").map(String::as_str), Some("30"));
    }

    #[test]
    fn blank_params_are_absent_and_garbage_is_rejected() {
        let params = HashMap::from([
            ("page".to_owned(), " ".to_owned()),
            ("limit".to_owned(), "ten".to_owned()),
        ]);
        assert_eq!(parse_param::<u64>(&params, "page").unwrap(), None);
        assert!(parse_param::<u64>(&params, "limit").is_err());
    }

    #[test]
    fn id_lists_split_on_commas() {
        let params = HashMap::from([("tags".to_owned(), "1, 4,9".to_owned())]);
        assert_eq!(parse_id_list(&params, "tags").unwrap(), Some(vec![1, 4, 9]));
    }

    #[test]
    fn single_sort_type_applies_to_all_fields() {
        let ordering = parse_ordering(Some("price,title"), Some("des"), &["price", "title"]);
        assert_eq!(
            ordering,
            vec![("price".to_owned(), Order::Desc), ("title".to_owned(), Order::Desc)]
        );
    }

    #[test]
    fn sort_types_pair_with_fields() {
        let ordering = parse_ordering(Some("price,title"), Some("asc,des"), &["price", "title"]);
        assert_eq!(
            ordering,
            vec![("price".to_owned(), Order::Asc), ("title".to_owned(), Order::Desc)]
        );
    }

    #[test]
    fn mismatched_sort_types_fall_back_to_ascending() {
        let ordering = parse_ordering(Some("price,title"), Some("des,des,des"), &["price", "title"]);
        assert_eq!(
            ordering,
            vec![("price".to_owned(), Order::Asc), ("title".to_owned(), Order::Asc)]
        );
    }

    #[test]
    fn unknown_sort_fields_are_dropped() {
        let ordering = parse_ordering(Some("password,price"), None, &["price"]);
        assert_eq!(ordering, vec![("price".to_owned(), Order::Asc)]);
        assert!(parse_ordering(Some("password"), None, &["price"]).is_empty());
    }

    #[test]
    fn pages_are_clamped() {
        assert_eq!(clamp_page(None, 0), (1, 1));
        assert_eq!(clamp_page(Some(0), 3), (1, 3));
        assert_eq!(clamp_page(Some(9), 3), (3, 3));
        assert_eq!(clamp_page(Some(2), 3), (2, 3));
    }
}
