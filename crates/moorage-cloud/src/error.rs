//! Engine error types

use thiserror::Error;

/// Errors surfaced by the reconciliation engine and its adapters
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("invalid provider ID: {0}")]
    InvalidProviderId(String),

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("load balancer not found: {0}")]
    LoadBalancerNotFound(String),

    #[error("instance {0} has no usable address: {1}")]
    AddressUnavailable(String, String),

    #[error("invalid service configuration: {0}")]
    Validation(String),

    #[error("provider API error: {message}")]
    Api {
        message: String,
        /// Network failures and 5xx responses; callers may retry
        transient: bool,
    },

    #[error("instance metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("operation not supported by provider: {0}")]
    Unsupported(String),
}

impl CloudError {
    /// Build an API error from a remote status code
    pub fn api_status(status: u16, message: impl Into<String>) -> Self {
        CloudError::Api {
            message: message.into(),
            transient: status >= 500,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Api { transient: true, .. })
    }

    /// Whether the error reports plain absence rather than failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CloudError::InstanceNotFound(_) | CloudError::LoadBalancerNotFound(_)
        )
    }
}

impl From<reqwest::Error> for CloudError {
    fn from(err: reqwest::Error) -> Self {
        let transient = err.is_timeout()
            || err.is_connect()
            || err.status().is_none_or(|s| s.is_server_error());
        CloudError::Api {
            message: err.to_string(),
            transient,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
