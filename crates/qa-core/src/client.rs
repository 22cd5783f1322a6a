//! Traits for the two external services a computation query depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::ResultTree;

/// Sends a query to the knowledge-computation service.
#[async_trait]
pub trait ComputationClient: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when the service understood the request but has no
    /// answer for it.
    async fn query(&self, input: &str) -> Result<Option<ResultTree>, Error>;
}

/// Re-uploads remote images to a host we control.
#[async_trait]
pub trait ImageHostingClient: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(&self, url: &str, options: &UploadOptions) -> Result<HostedImage, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    pub format: String,
}

impl UploadOptions {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedImage {
    pub secure_url: String,
    pub width: u32,
    pub height: u32,
}
