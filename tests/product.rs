mod common;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{dec, spawn_app};

fn titles(page: &Value) -> Vec<&str> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let app = spawn_app().await;
    let category = app.category("Bakery", None).await;
    let mut admin = app.admin().await;

    let (status, body) = admin
        .post(
            "/api/admin/product",
            json!({
                "category_id": category,
                "title": "Bagel",
                "description": "A boiled then baked ring of dough with a dense, chewy crumb.",
                "price": "12.50"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = admin.get(&format!("/api/admin/product/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["available"], true);
    assert_eq!(body["quantity_sold"], 0);
    assert_eq!(dec(&body["price"]), Decimal::new(1250, 2));
    assert_eq!(
        body["short_description"],
        "A boiled then baked ring of dough with a dense, ch..."
    );

    let (status, _) = admin
        .patch(
            &format!("/api/admin/product/{id}"),
            json!({ "price": 15, "available": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = admin.get("/api/admin/product?min_price=14&query=bag").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["available"], false);

    let (status, _) = admin.delete(&format!("/api/admin/product/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = admin.get(&format!("/api/admin/product/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_product_validation() {
    let app = spawn_app().await;
    let category = app.category("Bakery", None).await;
    let mut admin = app.admin().await;

    let (status, _) = admin
        .post(
            "/api/admin/product",
            json!({ "category_id": category, "title": "Bagel", "price": "-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin
        .post(
            "/api/admin/product",
            json!({ "category_id": 999, "title": "Bagel", "price": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = admin
        .post(
            "/api/admin/product",
            json!({ "category_id": category, "title": "Bagel", "price": 1, "tag_ids": [42] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No tag with 42 id was found.");
}

#[tokio::test]
async fn test_storefront_product_list_filters() {
    let app = spawn_app().await;
    let bakery = app.category("Bakery", None).await;
    let dairy = app.category("Dairy", None).await;
    app.product(bakery, "Bagel", 100).await;
    app.product_with(bakery, "Stale roll", 20, 0, false).await;
    let milk = app.product(dairy, "Milk", 70).await;
    let fresh = app.tag("fresh").await;
    let mut admin = app.admin().await;
    admin
        .put(&format!("/api/admin/product/{milk}/tags"), json!({ "tag_ids": [fresh] }))
        .await;

    let mut visitor = app.visitor();
    let (_, body) = visitor.get("/api/products").await;
    assert_eq!(titles(&body), vec!["Bagel", "Milk", "Stale roll"]);

    let (_, body) = visitor.get(&format!("/api/products?category={bakery}&available=true")).await;
    assert_eq!(titles(&body), vec!["Bagel"]);

    let (_, body) = visitor.get("/api/products?search=about%20milk").await;
    assert_eq!(titles(&body), vec!["Milk"]);

    let (_, body) = visitor.get("/api/products?min_price=50&max_price=80").await;
    assert_eq!(titles(&body), vec!["Milk"]);

    let (_, body) = visitor.get(&format!("/api/products?tag={fresh}")).await;
    assert_eq!(titles(&body), vec!["Milk"]);

    let (_, body) = visitor.get(&format!("/api/tags/{fresh}")).await;
    assert_eq!(body["name"], "fresh");
    assert_eq!(titles(&body["products"]), vec!["Milk"]);
}

#[tokio::test]
async fn test_product_detail_with_related() {
    let app = spawn_app().await;
    let bakery = app.category("Bakery", None).await;
    let dairy = app.category("Dairy", None).await;
    let bagel = app.product(bakery, "Bagel", 100).await;
    for n in 0..5 {
        app.product(bakery, &format!("Bun {n}"), 10).await;
    }
    app.product(dairy, "Milk", 70).await;
    let mut visitor = app.visitor();

    let (status, body) = visitor.get(&format!("/api/products/{bagel}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Bagel");
    let related = body["related_products"].as_array().unwrap();
    assert_eq!(related.len(), 4);
    assert!(related
        .iter()
        .all(|p| p["category_id"] == bakery && p["id"] != bagel));

    let (status, body) = visitor.get("/api/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No product with 999 id was found.");
}
