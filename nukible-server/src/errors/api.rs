use crate::devices::LinkError;

use super::{AuthError, DeviceError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Device link error: {0}")]
    LinkError(#[from] LinkError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
