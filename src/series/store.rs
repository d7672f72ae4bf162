use tracing::{debug, info};

use super::metrics::{self, DominantCounts, ScoreAccumulator};
use super::types::{Emotion, EmotionScores, Observation};
use crate::error::SeriesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesState {
    Empty,
    NonEmpty,
}

/// Append-only, time-ordered series of emotion observations for one session.
///
/// The store has a single owner and no interior locking. Entries are never
/// edited or removed individually; `clear` is the only way to drop them.
#[derive(Debug, Default)]
pub struct EmotionSeriesStore {
    observations: Vec<Observation>,
    totals: ScoreAccumulator,
    dominant: DominantCounts,
}

impl EmotionSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `observation` after the current latest one.
    ///
    /// Rejects values outside [0, 1] and timestamps earlier than the latest
    /// entry. `SeriesError::Exhausted` means the series cannot grow any more
    /// and is fatal for the session.
    pub fn append(&mut self, observation: Observation) -> Result<(), SeriesError> {
        observation.validate()?;

        if let Some(latest) = self.observations.last() {
            if observation.timestamp < latest.timestamp {
                return Err(SeriesError::OutOfOrder {
                    latest: latest.timestamp,
                    timestamp: observation.timestamp,
                });
            }
        }

        self.observations.try_reserve(1)?;
        self.totals.add(&observation.scores);
        self.dominant.record(observation.dominant_emotion);

        debug!(
            timestamp = observation.timestamp,
            emotion = %observation.dominant_emotion,
            confidence = observation.confidence,
            "observation appended"
        );
        self.observations.push(observation);
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.observations.is_empty() {
            return;
        }
        info!(dropped = self.observations.len(), "emotion series cleared");
        self.observations.clear();
        self.totals.reset();
        self.dominant.clear();
    }

    pub fn size(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn state(&self) -> SeriesState {
        if self.observations.is_empty() {
            SeriesState::Empty
        } else {
            SeriesState::NonEmpty
        }
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Observations in append order.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Mean score of every label over the whole series; zeros when empty.
    pub fn average_scores(&self) -> EmotionScores {
        self.totals.mean()
    }

    /// The `n` strongest labels of a single observation.
    pub fn top_n(observation: &Observation, n: usize) -> Vec<(Emotion, f64)> {
        metrics::rank(&observation.scores, n)
    }

    pub fn dominant_counts(&self) -> DominantCounts {
        self.dominant
    }

    /// Elapsed milliseconds from first to last observation.
    pub fn duration_ms(&self) -> i64 {
        metrics::span_ms(&self.observations)
    }
}
