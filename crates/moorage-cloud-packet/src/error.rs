//! Packet provider error types

use moorage_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Packet API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

impl From<PacketError> for CloudError {
    fn from(err: PacketError) -> Self {
        match err {
            PacketError::DeviceNotFound(id) => CloudError::InstanceNotFound(id),
            PacketError::Http(e) => e.into(),
            PacketError::Api { status, message } => CloudError::api_status(status, message),
            PacketError::MissingEnvVar(_) => CloudError::Validation(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PacketError>;
