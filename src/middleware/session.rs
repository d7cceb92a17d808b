use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::session::{SessionStore, SESSION_HEADER};

/// Attaches a [`crate::session::Session`] to the request. The id is echoed
/// back once the session is stored, unless the handler already set a new one.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let requested = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let session = store.open(requested.as_deref());
    let session_id = session.id().to_owned();
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;
    if response.headers().contains_key(SESSION_HEADER) || !store.contains(&session_id) {
        return response;
    }
    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
