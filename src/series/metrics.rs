use std::cmp::Ordering;

use super::types::{Emotion, EmotionScores, Observation};

/// Running per-label sums. Kept in step with the store so averages
/// never need a rescan.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    sums: EmotionScores,
    count: usize,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scores: &EmotionScores) {
        for (emotion, value) in scores.iter() {
            self.sums.set(emotion, self.sums.get(emotion) + value);
        }
        self.count += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean per label. All zeros when nothing was added.
    pub fn mean(&self) -> EmotionScores {
        if self.count == 0 {
            return EmotionScores::default();
        }
        let n = self.count as f64;
        self.sums.map(|sum| sum / n)
    }
}

/// Highest `n` labels, descending by score. Equal scores keep canonical
/// order because the sort is stable over a canonically ordered input.
/// `-0.0` and `0.0` compare equal.
pub fn rank(scores: &EmotionScores, n: usize) -> Vec<(Emotion, f64)> {
    let mut ranked: Vec<(Emotion, f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(n.min(Emotion::COUNT));
    ranked
}

/// How often each label was dominant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DominantCounts([usize; Emotion::COUNT]);

impl DominantCounts {
    pub fn record(&mut self, emotion: Emotion) {
        self.0[emotion.index()] += 1;
    }

    pub fn get(&self, emotion: Emotion) -> usize {
        self.0[emotion.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Most frequent dominant label; ties go to canonical order.
    pub fn most_frequent(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, usize)> = None;
        for emotion in Emotion::ALL {
            let count = self.get(emotion);
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((emotion, count));
            }
        }
        best.map(|(emotion, _)| emotion)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Milliseconds between the first and last observation, 0 below two.
pub fn span_ms(observations: &[Observation]) -> i64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) if observations.len() >= 2 => last.timestamp.saturating_sub(first.timestamp),
        _ => 0,
    }
}
