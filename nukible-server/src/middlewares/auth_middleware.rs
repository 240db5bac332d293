use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;

use crate::errors::ApiError;
use crate::services::TokenService;

#[derive(Clone)]
pub struct TokenState {
    pub token_service: Arc<TokenService>,
}

/// Token check for every bridge route. The token travels in the query
/// string, plain or hashed; rejected requests never reach a handler.
pub async fn auth(
    State(state): State<TokenState>,
    req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let query = req.uri().query().unwrap_or("");
    if let Err(err) = state.token_service.authorize_query(query) {
        tracing::warn!(path = %req.uri().path(), "rejected unauthorized request");
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
