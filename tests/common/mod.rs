#![allow(dead_code)]

use chrono::{Duration, Utc};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::Value;
use std::sync::Arc;

use remi_shop::config::Config;
use remi_shop::create_app;
use remi_shop::entities::{
    category, hash_password, product, promotion, promotion_product, setup_schema, tag, user,
};
use remi_shop::session::{SessionStore, SESSION_HEADER};

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub address: String,
    pub db: Arc<DatabaseConnection>,
    client: reqwest::Client,
}

/// Serves the app on an ephemeral port over a fresh SQLite file.
pub async fn spawn_app() -> TestApp {
    let path = std::env::temp_dir().join(format!("remi-shop-{}.sqlite", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to open test database");
    setup_schema(&db).await.expect("Failed to create schema");
    let db = Arc::new(db);

    let config = Config {
        database_url,
        bind_addr: "127.0.0.1:0".to_owned(),
        secret: "test-secret".to_owned(),
        token_ttl_hours: 1,
        session_ttl_hours: 1,
        admin_username: None,
        admin_password: None,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = format!("http://{}", listener.local_addr().expect("No local address"));

    let app = create_app(db.clone(), Arc::new(config), SessionStore::new(1));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server crashed");
    });

    TestApp {
        address,
        db,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// A client with its own session and no login.
    pub fn visitor(&self) -> Visitor<'_> {
        Visitor {
            app: self,
            session: None,
            token: None,
        }
    }

    pub async fn create_user(&self, username: &str, role: user::Role) -> i32 {
        user::ActiveModel {
            username: Set(username.to_owned()),
            password: Set(hash_password(PASSWORD).expect("Failed to hash password")),
            role: Set(role),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to create user")
        .id
    }

    /// A logged-in admin visitor.
    pub async fn admin(&self) -> Visitor<'_> {
        self.create_user("admin", user::Role::Admin).await;
        let mut admin = self.visitor();
        assert_eq!(admin.login("admin", PASSWORD).await, StatusCode::OK);
        admin
    }

    pub async fn category(&self, title: &str, parent_id: Option<i32>) -> i32 {
        let now = Utc::now();
        category::ActiveModel {
            title: Set(title.to_owned()),
            parent_id: Set(parent_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to create category")
        .id
    }

    pub async fn product(&self, category_id: i32, title: &str, price: i64) -> i32 {
        self.product_with(category_id, title, price, 10, true).await
    }

    pub async fn product_with(
        &self,
        category_id: i32,
        title: &str,
        price: i64,
        count: i32,
        available: bool,
    ) -> i32 {
        let now = Utc::now();
        product::ActiveModel {
            category_id: Set(category_id),
            title: Set(title.to_owned()),
            description: Set(format!("About {title}")),
            price: Set(Decimal::from(price)),
            count: Set(count),
            available: Set(available),
            quantity_sold: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to create product")
        .id
    }

    /// A promotion running from yesterday to tomorrow unless `running` is false,
    /// in which case it already ended.
    pub async fn promotion(&self, title: &str, percent: i32, running: bool) -> i32 {
        let now = Utc::now();
        let (start_date, end_date) = if running {
            (now - Duration::days(1), now + Duration::days(1))
        } else {
            (now - Duration::days(10), now - Duration::days(5))
        };
        promotion::ActiveModel {
            title: Set(title.to_owned()),
            description: Set(String::new()),
            discount_percent: Set(Some(percent)),
            start_date: Set(start_date),
            end_date: Set(end_date),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to create promotion")
        .id
    }

    pub async fn link_promotion(&self, promotion_id: i32, product_id: i32) {
        promotion_product::ActiveModel {
            promotion_id: Set(promotion_id),
            product_id: Set(product_id),
            limit: Set(None),
            quantity_sold: Set(0),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to link promotion");
    }

    pub async fn tag(&self, name: &str) -> i32 {
        let now = Utc::now();
        tag::ActiveModel {
            name: Set(name.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("Failed to create tag")
        .id
    }
}

/// Carries the session id (and a bearer token once logged in) between requests.
pub struct Visitor<'a> {
    app: &'a TestApp,
    pub session: Option<String>,
    pub token: Option<String>,
}

impl Visitor<'_> {
    pub async fn get(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn put(&mut self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, None).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> StatusCode {
        let (status, body) = self
            .post(
                "/api/login",
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        self.token = body["token"].as_str().map(str::to_owned);
        status
    }

    pub async fn logout(&mut self) -> StatusCode {
        let (status, _) = self.post("/api/logout", serde_json::json!({})).await;
        self.token = None;
        status
    }

    async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self
            .app
            .client
            .request(method, format!("{}{}", self.app.address, path));
        if let Some(session) = &self.session {
            request = request.header(SESSION_HEADER, session);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("Failed to send request");
        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            self.session = Some(session.to_owned());
        }
        let status = response.status();
        let text = response.text().await.expect("Failed to read body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        (status, body)
    }
}

/// Decimals travel as strings; compare numerically.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(text) => text.parse().expect("Not a decimal string"),
        Value::Number(number) => number.to_string().parse().expect("Not a decimal number"),
        other => panic!("Expected a decimal, got {other}"),
    }
}
