pub mod api;
pub mod auth;
pub mod config;
pub mod device;

pub use api::ApiError;
pub use auth::AuthError;
pub use config::ConfigError;
pub use device::DeviceError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::AuthError(e) => (e.status_code(), e.to_string(), None),
            ApiError::DeviceError(e) => (e.status_code(), e.to_string(), None),
            // Protocol rejections are rendered by the handlers; anything
            // that reaches this point is a transport failure.
            ApiError::LinkError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Device link error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        (status, body).into_response()
    }
}
