use axum::{
    extract::Extension,
    http::{HeaderValue, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::basket::sync::sync_from_db;
use crate::config::Config;
use crate::entities::{
    hash_password,
    user::{self, Entity as UserEntity, Role},
};
use crate::middleware::auth::generate_token;
use crate::middleware::logging::{to_response, ApiError};
use crate::session::{Session, SESSION_HEADER};

pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .layer(Extension(db))
}

async fn register_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterUser>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let taken = UserEntity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_owned()));
    }

    let password =
        hash_password(&payload.password).map_err(|err| ApiError::PasswordHashFailed(err.to_string()))?;

    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        password: Set(password),
        role: Set(Role::User),
        ..Default::default()
    };
    UserEntity::insert(new_user).exec(&txn).await?;
    txn.commit().await?;
    info!(username = %payload.username, "Registered user");

    Ok(to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "User registered successfully"
            })),
        ),
        Ok(()),
    ))
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mut session): Extension<Session>,
    Json(payload): Json<UserLogin>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_owned());
    let model = UserEntity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(invalid)?;
    model.check_hash(&payload.password).map_err(|_| invalid())?;

    let token = generate_token(model.id, model.role, &config.secret, config.token_ttl_hours)
        .map_err(|err| ApiError::TokenGenerationFailed(err.to_string()))?;

    // a basket left behind by another account is not carried over
    if session.data().user_id.is_some_and(|bound| bound != model.id) {
        session.basket_mut().clear();
    }
    session.data_mut().user_id = Some(model.id);
    sync_from_db(&txn, model.id, session.basket_mut()).await?;
    txn.commit().await?;
    session.rotate();
    session.save();
    info!(user_id = model.id, "Logged in");

    let mut response = to_response(
        (
            StatusCode::OK,
            Json(json!({
                "token": token
            })),
        ),
        Ok(()),
    );
    if let Ok(value) = HeaderValue::from_str(session.id()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    Ok(response)
}

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("valid username regex"));

#[derive(Deserialize, Validate)]
struct RegisterUser {
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username must be 3-32 letters, digits or underscores"
    ))]
    username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

#[derive(Deserialize)]
struct UserLogin {
    username: String,
    password: String,
}
