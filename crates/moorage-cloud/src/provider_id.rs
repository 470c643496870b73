//! Provider ID codec
//!
//! The control plane stores a node's backing resource as an opaque
//! `<scheme>://<resource-id>` string. The codec owns that format; the
//! resource ID itself is never interpreted here.

use crate::error::{CloudError, Result};

/// Encoder/decoder for one provider's ID scheme
#[derive(Debug, Clone, Copy)]
pub struct ProviderIdCodec {
    scheme: &'static str,
}

impl ProviderIdCodec {
    pub const fn new(scheme: &'static str) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Format a resource ID as a provider ID, `<scheme>://<id>`
    pub fn encode(&self, resource_id: &str) -> String {
        format!("{}://{}", self.scheme, resource_id)
    }

    /// Extract the resource ID from a provider ID.
    ///
    /// Accepts exactly `<scheme>://<id>`; anything else is
    /// `InvalidProviderId`.
    pub fn decode<'a>(&self, provider_id: &'a str) -> Result<&'a str> {
        if provider_id.is_empty() {
            return Err(CloudError::InvalidProviderId(
                "provider ID cannot be an empty string".to_string(),
            ));
        }

        let segments: Vec<&str> = provider_id.split('/').collect();
        if segments.len() != 3 {
            return Err(CloudError::InvalidProviderId(format!(
                "unexpected format: {provider_id}, expected {}://12345",
                self.scheme
            )));
        }

        // segments[0] still carries the trailing colon
        if segments[0].strip_suffix(':') != Some(self.scheme) {
            return Err(CloudError::InvalidProviderId(format!(
                "scheme of {provider_id} does not match provider {}",
                self.scheme
            )));
        }

        Ok(segments[2])
    }
}
