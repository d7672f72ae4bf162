use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ExportError, SeriesError};
use crate::series::metrics::DominantCounts;
use crate::series::{write_export, Emotion, EmotionScores, EmotionSeriesStore, ExportFormat, Observation};
use crate::services::llm::{ChatReply, ChatService};

const SUMMARY_TOP_N: usize = 3;

/// Read-only digest of the series for display.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub records: usize,
    pub duration_ms: i64,
    pub latest: Option<Observation>,
    /// Strongest labels of the latest observation.
    pub latest_top: Vec<(Emotion, f64)>,
    pub averages: EmotionScores,
    pub dominant_counts: DominantCounts,
}

/// One user session. Sole owner of its emotion series; the sampler feeds
/// it through [`Session::ingest`] and readers only borrow the store.
pub struct Session {
    id: Uuid,
    store: EmotionSeriesStore,
    export_dir: PathBuf,
    chat: ChatService,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, "session created");
        Self {
            id,
            store: EmotionSeriesStore::new(),
            export_dir: config.export_dir.clone(),
            chat: ChatService::new(config),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &EmotionSeriesStore {
        &self.store
    }

    pub fn ingest(&mut self, observation: Observation) -> Result<(), SeriesError> {
        self.store.append(observation)
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Dominant label of the latest observation, neutral before the first one.
    pub fn current_emotion(&self) -> Emotion {
        self.store
            .latest()
            .map(|o| o.dominant_emotion)
            .unwrap_or_default()
    }

    pub fn summary(&self) -> SessionSummary {
        let latest = self.store.latest().cloned();
        let latest_top = latest
            .as_ref()
            .map(|o| EmotionSeriesStore::top_n(o, SUMMARY_TOP_N))
            .unwrap_or_default();
        SessionSummary {
            records: self.store.size(),
            duration_ms: self.store.duration_ms(),
            latest,
            latest_top,
            averages: self.store.average_scores(),
            dominant_counts: self.store.dominant_counts(),
        }
    }

    pub fn export(&self, format: ExportFormat) -> Result<PathBuf, ExportError> {
        self.export_at(format, Utc::now())
    }

    pub fn export_at(&self, format: ExportFormat, exported_at: DateTime<Utc>) -> Result<PathBuf, ExportError> {
        write_export(&self.export_dir, &self.store, format, exported_at)
    }

    pub async fn chat(&self, message: &str) -> ChatReply {
        self.chat_task(message.to_string()).await
    }

    /// Detached chat turn, tagged with the emotion current at call time.
    /// Holds no borrow of the session, so it can be spawned while
    /// observations keep arriving.
    pub fn chat_task(&self, message: String) -> impl Future<Output = ChatReply> + Send + 'static {
        let chat = self.chat.clone();
        let emotion = self.current_emotion();
        async move { chat.reply(&message, emotion).await }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        info!(session = %self.id, records = self.store.size(), "session ended");
    }
}
