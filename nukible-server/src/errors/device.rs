use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device state not read yet")]
    StateUnavailable,

    #[error("Invalid request parameters")]
    InvalidRequest,
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::DeviceNotFound => StatusCode::NOT_FOUND,
            DeviceError::StateUnavailable => StatusCode::NOT_FOUND,
            DeviceError::InvalidRequest => StatusCode::BAD_REQUEST,
        }
    }
}
