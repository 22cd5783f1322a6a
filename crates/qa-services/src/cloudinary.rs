//! Cloudinary image rehosting via unsigned uploads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use qa_core::{Error, HostedImage, ImageHostingClient, UploadOptions};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    upload_preset: String,
    base_url: String,
}

impl CloudinaryClient {
    /// `upload_preset` must name an unsigned preset on the account.
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("quick-answer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }

    fn parse_error(&self, status: u16, body: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(err) => Error::api(status, err.error.message),
            Err(_) => Error::api(status, body.to_string()),
        }
    }
}

#[async_trait]
impl ImageHostingClient for CloudinaryClient {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, url: &str, options: &UploadOptions) -> Result<HostedImage, Error> {
        debug!(url, format = %options.format, "Cloudinary upload");

        let response = self
            .client
            .post(self.upload_url())
            .form(&[
                ("file", url),
                ("upload_preset", self.upload_preset.as_str()),
                ("format", options.format.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        if !status.is_success() {
            return Err(self.parse_error(status.as_u16(), &body));
        }

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| Error::serialization(format!("Cloudinary upload response: {}", e)))?;
        Ok(HostedImage {
            secure_url: uploaded.secure_url,
            width: uploaded.width,
            height: uploaded.height,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    width: u32,
    height: u32,
}
