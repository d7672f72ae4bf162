//! Serialization of a session's emotion series.
//!
//! Two payloads are produced on demand: comma separated rows for
//! spreadsheets and a JSON document that carries every observation
//! verbatim and can be read back into [`Observation`]s.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::store::EmotionSeriesStore;
use super::types::{Emotion, EmotionScores, Observation};
use crate::error::ExportError;

const FILE_PREFIX: &str = "emotion-analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Rows,
    Structured,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Rows => "csv",
            ExportFormat::Structured => "json",
        }
    }
}

/// `emotion-analysis-<epoch_millis>.<csv|json>`
pub fn export_file_name(format: ExportFormat, epoch_millis: i64) -> String {
    format!("{}-{}.{}", FILE_PREFIX, epoch_millis, format.extension())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredExport {
    pub export_date: String,
    pub total_records: usize,
    /// Milliseconds between first and last observation.
    pub duration: i64,
    pub data: Vec<ExportedObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedObservation {
    pub timestamp: i64,
    pub time: String,
    pub emotion: Emotion,
    pub confidence: f64,
    pub scores: EmotionScores,
}

impl From<&Observation> for ExportedObservation {
    fn from(observation: &Observation) -> Self {
        Self {
            timestamp: observation.timestamp,
            time: iso_time(observation.timestamp),
            emotion: observation.dominant_emotion,
            confidence: observation.confidence,
            scores: observation.scores,
        }
    }
}

impl ExportedObservation {
    pub fn to_observation(&self) -> Observation {
        Observation::new(self.timestamp, self.emotion, self.confidence, self.scores)
    }
}

impl StructuredExport {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(payload: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.data.iter().map(ExportedObservation::to_observation).collect()
    }
}

impl EmotionSeriesStore {
    /// Header line plus one line per observation. Percentages carry two
    /// decimals and a `%` suffix.
    pub fn export_rows(&self) -> String {
        let mut out = String::new();
        out.push_str("Timestamp,Time,Dominant Emotion,Confidence");
        for emotion in Emotion::ALL {
            out.push(',');
            out.push_str(emotion.title());
        }
        out.push('\n');

        for observation in self.iter() {
            out.push_str(&format!(
                "{},{},{},{}",
                observation.timestamp,
                readable_time(observation.timestamp),
                observation.dominant_emotion,
                percent(observation.confidence),
            ));
            for (_, value) in observation.scores.iter() {
                out.push(',');
                out.push_str(&percent(value));
            }
            out.push('\n');
        }
        out
    }

    pub fn export_structured(&self) -> StructuredExport {
        self.export_structured_at(Utc::now())
    }

    /// Same as [`export_structured`](Self::export_structured) with a fixed
    /// export time.
    pub fn export_structured_at(&self, exported_at: DateTime<Utc>) -> StructuredExport {
        StructuredExport {
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_records: self.size(),
            duration: self.duration_ms(),
            data: self.iter().map(ExportedObservation::from).collect(),
        }
    }

    pub fn render(&self, format: ExportFormat, exported_at: DateTime<Utc>) -> Result<String, ExportError> {
        match format {
            ExportFormat::Rows => Ok(self.export_rows()),
            ExportFormat::Structured => self.export_structured_at(exported_at).to_json(),
        }
    }
}

/// Writes the rendered payload into `dir` under the conventional file name.
pub fn write_export(
    dir: &Path,
    store: &EmotionSeriesStore,
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let payload = store.render(format, exported_at)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(format, exported_at.timestamp_millis()));
    fs::write(&path, payload)?;
    info!(path = %path.display(), records = store.size(), "emotion series exported");
    Ok(path)
}

fn percent(value: f64) -> String {
    let scaled = value * 100.0;
    // Keep -0.0 from printing as "-0.00%"
    let scaled = if scaled == 0.0 { 0.0 } else { scaled };
    format!("{:.2}%", scaled)
}

fn utc(epoch_millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(epoch_millis).single()
}

fn iso_time(epoch_millis: i64) -> String {
    utc(epoch_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn readable_time(epoch_millis: i64) -> String {
    utc(epoch_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_default()
}
