use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use tracing::debug;

use super::types::{Detection, DetectionResponse};
use crate::config::AppConfig;

/// Anything that can classify one encoded frame.
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    async fn detect(&self, frame: &[u8]) -> Result<Detection>;
}

/// HTTP client for the classification backend.
#[derive(Clone)]
pub struct DetectorService {
    client: Client,
    base_url: String,
}

impl DetectorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .unwrap_or_default(),
            base_url: config.detector_url.clone(),
        }
    }
}

#[async_trait]
impl EmotionDetector for DetectorService {
    async fn detect(&self, frame: &[u8]) -> Result<Detection> {
        let image = format!("data:image/jpeg;base64,{}", BASE64.encode(frame));

        let response = self
            .client
            .post(format!("{}/api/emotion", self.base_url))
            .form(&[("image", image)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Emotion service error: {}", response.status()));
        }

        let body: DetectionResponse = response.json().await?;
        debug!(emotion = %body.emotion, model = ?body.model, "detector answered");
        body.normalize()
    }
}
