use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::series::{clamp_unit, Emotion, EmotionScores, Observation};

/// Body returned by `POST /api/emotion`.
/// Failed detections still answer 200 and set `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionResponse {
    pub emotion: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub all_emotions: HashMap<String, f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A normalized classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub emotion: Emotion,
    pub confidence: f64,
    pub scores: EmotionScores,
}

impl DetectionResponse {
    pub fn normalize(self) -> Result<Detection> {
        if let Some(error) = self.error {
            return Err(anyhow!("detector reported failure: {}", error));
        }

        let mut scores = EmotionScores::default();
        for (label, value) in &self.all_emotions {
            match label.parse::<Emotion>() {
                Ok(emotion) => scores.set(emotion, clamp_unit(*value)),
                Err(e) => debug!("ignoring score: {}", e),
            }
        }

        Ok(Detection {
            emotion: Emotion::from_label_or_neutral(&self.emotion),
            confidence: clamp_unit(self.confidence),
            scores,
        })
    }
}

impl Detection {
    pub fn into_observation(self, timestamp: i64) -> Observation {
        Observation::new(timestamp, self.emotion, self.confidence, self.scores)
    }
}
