use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

use crate::config::PublisherSettings;

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Unit reported with every reading
pub const UNIT: &str = "L";

/// Pushes a reading to an external state store
pub trait ReadingPublisher {
    fn publish(&self, value: f64) -> impl Future<Output = Result<()>> + Send;
}

/// Home Assistant `POST /api/states/<entity_id>`
pub struct HomeAssistantPublisher {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    friendly_name: String,
}

impl HomeAssistantPublisher {
    pub fn new(settings: &PublisherSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PUBLISH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: state_url(&settings.api_url, &settings.entity_id),
            token: settings.token.clone(),
            friendly_name: settings.friendly_name.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReadingPublisher for HomeAssistantPublisher {
    async fn publish(&self, value: f64) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&state_payload(value, &self.friendly_name));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("state update rejected with HTTP {}: {}", status, body));
        }
        Ok(())
    }
}

pub fn state_url(api_url: &str, entity_id: &str) -> String {
    format!("{}/states/{}", api_url.trim_end_matches('/'), entity_id)
}

/// Body of a state update for `value` litres
pub fn state_payload(value: f64, friendly_name: &str) -> Value {
    json!({
        "state": value.to_string(),
        "attributes": {
            "unit_of_measurement": UNIT,
            "friendly_name": friendly_name,
            "device_class": "volume",
            "state_class": "total_increasing",
            "icon": "mdi:oil",
        }
    })
}
