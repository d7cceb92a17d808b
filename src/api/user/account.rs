use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::basket::sync::sync_to_db;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};
use crate::session::Session;

pub fn account_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/logout", post(logout))
        .layer(Extension(db))
}

/// Persists the session basket for the caller, then empties the session.
/// A session that is not bound to the caller is cleared without touching the
/// stored basket.
async fn logout(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Extension(mut session): Extension<Session>,
) -> Result<Response, ApiError> {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    if session.data().user_id == Some(claims.user_id) {
        sync_to_db(&txn, claims.user_id, session.basket_mut()).await?;
    } else {
        debug!(user_id = claims.user_id, "Session not bound to caller, basket not persisted");
    }
    txn.commit().await?;

    session.basket_mut().clear();
    session.data_mut().user_id = None;
    session.save();
    info!(user_id = claims.user_id, "Logged out");

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Logged out successfully"
            })),
        ),
        Ok(()),
    ))
}
