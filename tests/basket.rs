mod common;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{dec, spawn_app, PASSWORD};
use remi_shop::entities::user::Role;

fn entry<'a>(basket: &'a Value, product_id: i32) -> Option<&'a Value> {
    basket["items"]
        .as_array()
        .expect("items is not an array")
        .iter()
        .find(|item| item["product"]["id"] == product_id)
}

#[tokio::test]
async fn test_adding_twice_increments_count() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    let mut visitor = app.visitor();

    let (status, body) = visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["basket_count"], 1);

    let (_, body) = visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    assert_eq!(body["basket_count"], 2);
    assert_eq!(dec(&body["total_cost"]), Decimal::from(200));

    let (status, basket) = visitor.get("/api/basket").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(basket["items"].as_array().unwrap().len(), 1);
    let item = entry(&basket, bagel).expect("bagel missing");
    assert_eq!(item["count"], 2);
    assert_eq!(dec(&item["total_price"]), Decimal::from(200));
    assert_eq!(basket["basket_count"], 2);
}

#[tokio::test]
async fn test_add_unknown_or_unavailable_product() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let stale = app.product_with(category, "Stale bagel", 100, 0, false).await;
    let mut visitor = app.visitor();

    let (status, _) = visitor.post("/api/basket/add/9999", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = visitor.post(&format!("/api/basket/add/{stale}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (_, basket) = visitor.get("/api/basket").await;
    assert_eq!(basket["basket_count"], 0);
}

#[tokio::test]
async fn test_update_and_remove_entries() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    let roll = app.product(category, "Roll", 200).await;
    let mut visitor = app.visitor();

    visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    visitor.post(&format!("/api/basket/add/{roll}"), json!({})).await;

    let (status, body) = visitor
        .post(&format!("/api/basket/update/{bagel}"), json!({ "count": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(dec(&body["total_price"]), Decimal::from(500));
    assert_eq!(body["basket_count"], 6);
    assert_eq!(dec(&body["total_cost"]), Decimal::from(700));

    let (status, body) = visitor
        .post(&format!("/api/basket/update/{bagel}"), json!({ "count": "lots" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "message": "Invalid quantity" }));

    let (_, body) = visitor
        .post(&format!("/api/basket/update/{bagel}"), json!({ "count": 0 }))
        .await;
    assert_eq!(body["basket_count"], 1);

    let (_, body) = visitor
        .post(&format!("/api/basket/remove/{roll}"), json!({}))
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["basket_count"], 0);
    assert_eq!(dec(&body["total_cost"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_price_is_captured_until_refresh() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    app.create_user("shopper", Role::User).await;
    let mut visitor = app.visitor();

    // leaves an (empty) persisted basket behind, so the next login syncs
    assert_eq!(visitor.login("shopper", PASSWORD).await, StatusCode::OK);
    assert_eq!(visitor.logout().await, StatusCode::OK);

    visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;

    let promo = app.promotion("Ten off", 10, true).await;
    app.link_promotion(promo, bagel).await;

    // the existing entry keeps its captured price
    visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    let (_, basket) = visitor.get("/api/basket").await;
    let item = entry(&basket, bagel).unwrap();
    assert_eq!(dec(&item["price"]), Decimal::from(100));
    assert_eq!(item["count"], 3);

    // login refreshes prices, never counts
    assert_eq!(visitor.login("shopper", PASSWORD).await, StatusCode::OK);
    let (_, basket) = visitor.get("/api/basket").await;
    let item = entry(&basket, bagel).unwrap();
    assert_eq!(dec(&item["price"]), Decimal::from(90));
    assert_eq!(item["count"], 3);
    assert_eq!(dec(&basket["total_cost"]), Decimal::from(270));
}

#[tokio::test]
async fn test_login_keeps_session_entries() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    let roll = app.product(category, "Roll", 200).await;
    app.create_user("shopper", Role::User).await;

    let mut first = app.visitor();
    assert_eq!(first.login("shopper", PASSWORD).await, StatusCode::OK);
    first.post(&format!("/api/basket/update/{bagel}"), json!({ "count": 3 })).await;
    first.post(&format!("/api/basket/update/{roll}"), json!({ "count": 2 })).await;
    assert_eq!(first.logout().await, StatusCode::OK);

    let (_, basket) = first.get("/api/basket").await;
    assert_eq!(basket["basket_count"], 0);

    let mut second = app.visitor();
    second.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    assert_eq!(second.login("shopper", PASSWORD).await, StatusCode::OK);

    let (_, basket) = second.get("/api/basket").await;
    assert_eq!(entry(&basket, bagel).unwrap()["count"], 1);
    assert_eq!(entry(&basket, roll).unwrap()["count"], 2);
    assert_eq!(basket["basket_count"], 3);
}

#[tokio::test]
async fn test_logout_replaces_persisted_basket() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    let roll = app.product(category, "Roll", 200).await;
    let user_id = app.create_user("shopper", Role::User).await;

    let mut shopper = app.visitor();
    shopper.login("shopper", PASSWORD).await;
    shopper.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    shopper.post(&format!("/api/basket/add/{roll}"), json!({})).await;
    shopper.logout().await;

    shopper.login("shopper", PASSWORD).await;
    shopper.post(&format!("/api/basket/remove/{roll}"), json!({})).await;
    shopper.post(&format!("/api/basket/update/{bagel}"), json!({ "count": 4 })).await;
    shopper.logout().await;

    let mut admin = app.admin().await;
    let (status, baskets) = admin.get("/api/admin/basket").await;
    assert_eq!(status, StatusCode::OK);

    let stored = baskets
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["user_id"] == user_id)
        .expect("basket was not persisted");
    assert_eq!(stored["username"], "shopper");
    let items = stored["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], bagel);
    assert_eq!(items[0]["count"], 4);
    assert_eq!(dec(&stored["total_cost"]), Decimal::from(400));
}

#[tokio::test]
async fn test_logout_from_unbound_session_keeps_persisted_basket() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    let user_id = app.create_user("shopper", Role::User).await;

    let mut shopper = app.visitor();
    shopper.login("shopper", PASSWORD).await;
    shopper.post(&format!("/api/basket/update/{bagel}"), json!({ "count": 3 })).await;
    let token = shopper.token.clone();
    assert_eq!(shopper.logout().await, StatusCode::OK);

    // same token, fresh session
    shopper.session = None;
    shopper.token = token;
    assert_eq!(shopper.logout().await, StatusCode::OK);

    let mut admin = app.admin().await;
    let (_, baskets) = admin.get("/api/admin/basket").await;
    let stored = baskets
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["user_id"] == user_id)
        .expect("basket was not persisted");
    let items = stored["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], bagel);
    assert_eq!(items[0]["count"], 3);
}

#[tokio::test]
async fn test_switching_account_drops_previous_basket() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 100).await;
    app.create_user("alice", Role::User).await;
    let bob_id = app.create_user("bob", Role::User).await;

    let mut visitor = app.visitor();
    visitor.login("alice", PASSWORD).await;
    visitor.post(&format!("/api/basket/update/{bagel}"), json!({ "count": 4 })).await;

    assert_eq!(visitor.login("bob", PASSWORD).await, StatusCode::OK);
    let (_, basket) = visitor.get("/api/basket").await;
    assert_eq!(basket["basket_count"], 0);

    assert_eq!(visitor.logout().await, StatusCode::OK);
    let mut admin = app.admin().await;
    let (_, baskets) = admin.get("/api/admin/basket").await;
    let stored = baskets
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["user_id"] == bob_id)
        .expect("basket was not persisted");
    assert!(stored["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_quantities_are_bounded() {
    let app = spawn_app().await;
    let category = app.category("Bread", None).await;
    let bagel = app.product(category, "Bagel", 1).await;
    let roll = app.product(category, "Roll", 1).await;
    let mut visitor = app.visitor();

    let (_, body) = visitor
        .post(&format!("/api/basket/update/{bagel}"), json!({ "count": 2147483647 }))
        .await;
    assert_eq!(body, json!({ "success": false, "message": "Invalid quantity" }));

    let (_, body) = visitor
        .post(&format!("/api/basket/update/{bagel}"), json!({ "count": 32768 }))
        .await;
    assert_eq!(body["success"], false);

    for product in [bagel, roll] {
        let (status, body) = visitor
            .post(&format!("/api/basket/update/{product}"), json!({ "count": 32767 }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (status, body) = visitor.post(&format!("/api/basket/add/{bagel}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (status, basket) = visitor.get("/api/basket").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(basket["basket_count"], 65534);
    assert_eq!(dec(&basket["total_cost"]), Decimal::from(65534));
}
