use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use nukible_api::restful::{
    BridgeStateObject, CommandResponse, ProtocolErrorResponse, SimpleResponse,
};
use nukible_api::wire;
use serde::Deserialize;

use crate::devices::{DeviceRegistry, LinkError, LockDevice};
use crate::errors::{ApiError, DeviceError};

#[derive(Clone)]
pub struct DeviceState {
    pub registry: Arc<DeviceRegistry>,
}

#[derive(Clone, Deserialize)]
pub struct DeviceQuery {
    #[serde(rename = "nukiId")]
    pub nuki_id: String,
}

#[derive(Clone, Deserialize)]
pub struct ActionQuery {
    #[serde(rename = "nukiId")]
    pub nuki_id: String,
    pub action: u8,
}

#[derive(Clone, Deserialize)]
pub struct PinQuery {
    #[serde(rename = "nukiId")]
    pub nuki_id: String,
    pub pin: u16,
}

#[derive(Clone, Deserialize)]
pub struct LogQuery {
    #[serde(rename = "nukiId")]
    pub nuki_id: String,
    pub security_pin: u16,
    #[serde(default = "default_log_count")]
    pub count: u16,
    #[serde(default)]
    pub start_index: u32,
}

fn default_log_count() -> u16 {
    1
}

async fn resolve(registry: &DeviceRegistry, nuki_id: &str) -> Result<Arc<LockDevice>, ApiError> {
    let id = wire::parse_hex_id(nuki_id).ok_or(DeviceError::InvalidRequest)?;
    Ok(registry.by_nuki_id(id).await?)
}

/// Renders a device command result. Device-reported rejections become a
/// `success: false` body with HTTP 200, per the bridge API convention;
/// everything else stays an error.
async fn command_response(
    device: &LockDevice,
    result: Result<(), LinkError>,
) -> Result<Response, ApiError> {
    match result {
        Ok(()) => {
            let battery_critical = device.battery_critical().await;
            Ok(Json(CommandResponse {
                success: true,
                battery_critical,
            })
            .into_response())
        }
        Err(LinkError::Protocol { code }) => {
            Ok(Json(ProtocolErrorResponse::new(code)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// `/lockState`: the cached snapshot, never a fresh device read.
pub async fn lock_state(
    State(state): State<DeviceState>,
    Query(query): Query<DeviceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;
    let snapshot = device
        .last_state()
        .await
        .ok_or(DeviceError::StateUnavailable)?;

    Ok(Json(BridgeStateObject::from_state(&snapshot)))
}

pub async fn lock_device(
    State(state): State<DeviceState>,
    Query(query): Query<DeviceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;
    let result = device.lock().await;

    command_response(&device, result).await
}

pub async fn unlock_device(
    State(state): State<DeviceState>,
    Query(query): Query<DeviceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;
    let result = device.unlock().await;

    command_response(&device, result).await
}

pub async fn lock_action(
    State(state): State<DeviceState>,
    Query(query): Query<ActionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;
    let result = device.lock_action(query.action).await;

    command_response(&device, result).await
}

pub async fn verify_security_pin(
    State(state): State<DeviceState>,
    Query(query): Query<PinQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;

    match device.verify_pin(query.pin).await {
        Ok(valid) => Ok(Json(SimpleResponse { success: valid }).into_response()),
        Err(LinkError::Protocol { code }) => {
            Ok(Json(ProtocolErrorResponse::new(code)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn request_log_entries(
    State(state): State<DeviceState>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device = resolve(&state.registry, &query.nuki_id).await?;

    match device
        .fetch_log(query.security_pin, query.count, query.start_index)
        .await
    {
        Ok(entries) => Ok(Json(entries).into_response()),
        Err(LinkError::Protocol { code }) => {
            Ok(Json(ProtocolErrorResponse::new(code)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}
