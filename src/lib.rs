pub mod capture;
pub mod config;
pub mod error;
pub mod sampler;
pub mod series;
pub mod services;
pub mod session;

// Re-export the types most callers need
pub use series::{Emotion, EmotionScores, EmotionSeriesStore, Observation};
pub use session::Session;
