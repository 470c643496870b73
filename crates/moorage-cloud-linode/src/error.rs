//! Linode provider error types

use moorage_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinodeError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Linode API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("malformed resource ID: {0}")]
    MalformedId(String),
}

impl From<LinodeError> for CloudError {
    fn from(err: LinodeError) -> Self {
        match err {
            LinodeError::InstanceNotFound(id) => CloudError::InstanceNotFound(id),
            LinodeError::Http(e) => e.into(),
            LinodeError::Api { status, message } => CloudError::api_status(status, message),
            LinodeError::MissingEnvVar(_) | LinodeError::InvalidConfig(_) => {
                CloudError::Validation(err.to_string())
            }
            LinodeError::MalformedId(_) => CloudError::Api {
                message: err.to_string(),
                transient: false,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LinodeError>;
