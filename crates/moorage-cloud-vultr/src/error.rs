//! Vultr provider error types

use moorage_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VultrError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vultr API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("instance not found: {0}")]
    InstanceNotFound(String),
}

impl From<VultrError> for CloudError {
    fn from(err: VultrError) -> Self {
        match err {
            VultrError::InstanceNotFound(id) => CloudError::InstanceNotFound(id),
            VultrError::Http(e) => e.into(),
            VultrError::Api { status, message } => CloudError::api_status(status, message),
            VultrError::MissingEnvVar(_) => CloudError::Validation(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VultrError>;
