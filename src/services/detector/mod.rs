pub mod client;
pub mod types;

pub use client::{DetectorService, EmotionDetector};
pub use types::{Detection, DetectionResponse};
