use anyhow::{Context, Result};
use image::DynamicImage;
use std::future::Future;
use std::time::Duration;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(8);

/// Produces one decoded frame per poll cycle
pub trait FrameSource {
    fn fetch(&self) -> impl Future<Output = Result<DynamicImage>> + Send;
}

/// ESP32-CAM style snapshot endpoint
pub struct HttpCamera {
    client: reqwest::Client,
    url: String,
}

impl HttpCamera {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(CAPTURE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FrameSource for HttpCamera {
    async fn fetch(&self) -> Result<DynamicImage> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach camera at {}", self.url))?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        image::load_from_memory(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to decode snapshot ({} bytes): {}", bytes.len(), e))
    }
}
