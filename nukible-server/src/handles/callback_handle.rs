use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use nukible_api::restful::{CallbackListResponse, SimpleResponse};
use serde::Deserialize;
use url::Url;

use crate::devices::DeviceRegistry;
use crate::errors::{ApiError, DeviceError};
use crate::services::CallbackService;

#[derive(Clone)]
pub struct CallbackState {
    pub callbacks: Arc<CallbackService>,
    pub registry: Arc<DeviceRegistry>,
}

#[derive(Clone, Deserialize)]
pub struct AddCallbackQuery {
    pub url: String,
}

#[derive(Clone, Deserialize)]
pub struct RemoveCallbackQuery {
    pub id: usize,
}

/// `/callback/add`: registers a webhook URL. A full list still answers with
/// success; only http and https targets are accepted. The state observer is
/// wired up on the first registration, which also replays current snapshots
/// to the fresh subscriber.
pub async fn add_callback(
    State(state): State<CallbackState>,
    Query(query): Query<AddCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let url = Url::parse(&query.url).map_err(|_| DeviceError::InvalidRequest)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DeviceError::InvalidRequest.into());
    }

    state.callbacks.add(url).await;
    if !state.registry.has_observer().await {
        state
            .registry
            .set_state_observer(state.callbacks.clone())
            .await;
    }

    Ok(Json(SimpleResponse::ok()))
}

pub async fn list_callbacks(State(state): State<CallbackState>) -> impl IntoResponse {
    Json(CallbackListResponse {
        callbacks: state.callbacks.list().await,
    })
}

pub async fn remove_callback(
    State(state): State<CallbackState>,
    Query(query): Query<RemoveCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.callbacks.remove(query.id).await?;

    Ok(Json(SimpleResponse::ok()))
}
