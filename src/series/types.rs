use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{SeriesError, UnknownEmotion};

/// The closed set of labels the classifier reports.
/// Declaration order is the canonical order: it breaks ranking ties and
/// fixes the column order of every export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    #[default]
    Neutral,
}

impl Emotion {
    pub const COUNT: usize = 7;

    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprise,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprise => "surprise",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }

    /// Capitalized form used in column headers.
    pub fn title(self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Surprise => "Surprise",
            Emotion::Fear => "Fear",
            Emotion::Disgust => "Disgust",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Lenient parse for labels coming from outside the process.
    /// Anything unrecognized is treated as `Neutral`.
    pub fn from_label_or_neutral(label: &str) -> Self {
        label.parse().unwrap_or(Emotion::Neutral)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| UnknownEmotion(label.to_string()))
    }
}

/// One score per label. Labels never set read as 0.0.
/// Values are not required to sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Emotion, f64>", into = "BTreeMap<Emotion, f64>")]
pub struct EmotionScores([f64; Emotion::COUNT]);

impl EmotionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, value: f64) {
        self.0[emotion.index()] = value;
    }

    pub fn with(mut self, emotion: Emotion, value: f64) -> Self {
        self.set(emotion, value);
        self
    }

    /// (label, score) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.into_iter().map(move |e| (e, self.get(e)))
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }
}

impl From<BTreeMap<Emotion, f64>> for EmotionScores {
    fn from(map: BTreeMap<Emotion, f64>) -> Self {
        let mut scores = Self::default();
        for (emotion, value) in map {
            scores.set(emotion, value);
        }
        scores
    }
}

impl From<EmotionScores> for BTreeMap<Emotion, f64> {
    fn from(scores: EmotionScores) -> Self {
        scores.iter().collect()
    }
}

impl FromIterator<(Emotion, f64)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (Emotion, f64)>>(iter: I) -> Self {
        let mut scores = Self::default();
        for (emotion, value) in iter {
            scores.set(emotion, value);
        }
        scores
    }
}

/// One timestamped classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub dominant_emotion: Emotion,
    /// Score of `dominant_emotion`, 0.0 to 1.0. Not forced to equal
    /// `scores[dominant_emotion]`.
    pub confidence: f64,
    pub scores: EmotionScores,
}

impl Observation {
    pub fn new(timestamp: i64, dominant_emotion: Emotion, confidence: f64, scores: EmotionScores) -> Self {
        Self {
            timestamp,
            dominant_emotion,
            confidence,
            scores,
        }
    }

    /// Substitute used when a detection cycle fails.
    pub fn neutral_fallback(timestamp: i64) -> Self {
        Self::new(timestamp, Emotion::Neutral, 0.0, EmotionScores::default())
    }

    /// Clamps confidence and every score into [0, 1]. NaN and -0.0 become 0.0.
    pub fn clamped(self) -> Self {
        Self {
            confidence: clamp_unit(self.confidence),
            scores: self.scores.map(clamp_unit),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), SeriesError> {
        if Utc.timestamp_millis_opt(self.timestamp).single().is_none() {
            return Err(SeriesError::InvalidTimestamp(self.timestamp));
        }
        check_unit("confidence", self.confidence)?;
        for (emotion, value) in self.scores.iter() {
            if !is_unit(value) {
                return Err(SeriesError::OutOfRange {
                    field: format!("scores.{}", emotion),
                    value,
                });
            }
        }
        Ok(())
    }
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn check_unit(field: &str, value: f64) -> Result<(), SeriesError> {
    if is_unit(value) {
        Ok(())
    } else {
        Err(SeriesError::OutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() || value == 0.0 {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
