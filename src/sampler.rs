use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::FrameSource;
use crate::config::AppConfig;
use crate::series::Observation;
use crate::services::detector::EmotionDetector;

#[derive(Debug, Clone, Copy)]
pub struct SamplerSettings {
    pub interval: Duration,
    /// Upper bound on one detection call.
    pub timeout: Duration,
}

impl From<&AppConfig> for SamplerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: config.sample_interval,
            timeout: config.request_timeout,
        }
    }
}

/// Hands out wall-clock millis that never go backwards.
#[derive(Debug, Default)]
struct MonotonicClock {
    last: Option<i64>,
}

impl MonotonicClock {
    fn now_millis(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let ts = self.last.map_or(now, |last| now.max(last));
        self.last = Some(ts);
        ts
    }
}

/// Captures, classifies and forwards one observation per tick until
/// cancelled or until the receiving session goes away.
///
/// A failed or timed-out detection still produces an observation: the
/// neutral fallback. A tick without a frame produces nothing.
pub async fn sampling_loop<S, D>(
    mut source: S,
    detector: Arc<D>,
    tx: mpsc::Sender<Observation>,
    settings: SamplerSettings,
    cancel_token: CancellationToken,
) where
    S: FrameSource,
    D: EmotionDetector + ?Sized,
{
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = MonotonicClock::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (returned, frame) = match capture_blocking(source).await {
            Ok(captured) => captured,
            Err(e) => {
                warn!("frame source failed; sampler stopping: {}", e);
                return;
            }
        };
        source = returned;
        let Some(frame) = frame else {
            debug!("no frame this tick");
            continue;
        };

        let observation = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            observation = detect_once(detector.as_ref(), &frame, settings.timeout, &mut clock) => observation,
        };

        let sent = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            sent = tx.send(observation) => sent,
        };
        if sent.is_err() {
            info!("session receiver dropped; sampler stopping");
            return;
        }
    }
    info!("sampler shutting down");
}

/// Moves the source onto the blocking pool for one capture and hands it back.
async fn capture_blocking<S: FrameSource>(mut source: S) -> Result<(S, Option<Vec<u8>>)> {
    tokio::task::spawn_blocking(move || {
        let frame = source.capture();
        (source, frame)
    })
    .await
    .context("frame capture task failed")
}

async fn detect_once<D>(detector: &D, frame: &[u8], timeout: Duration, clock: &mut MonotonicClock) -> Observation
where
    D: EmotionDetector + ?Sized,
{
    let result = tokio::time::timeout(timeout, detector.detect(frame)).await;
    let timestamp = clock.now_millis();
    match result {
        Ok(Ok(detection)) => detection.into_observation(timestamp),
        Ok(Err(e)) => {
            warn!("emotion detection failed: {}", e);
            Observation::neutral_fallback(timestamp)
        }
        Err(_) => {
            warn!("emotion detection timed out (> {:?})", timeout);
            Observation::neutral_fallback(timestamp)
        }
    }
}

/// Owns the sampler task for one session.
pub struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start<S, D>(
        &mut self,
        source: S,
        detector: Arc<D>,
        tx: mpsc::Sender<Observation>,
        settings: SamplerSettings,
    ) -> Result<()>
    where
        S: FrameSource,
        D: EmotionDetector + ?Sized + 'static,
    {
        if self.handle.is_some() {
            bail!("sampler already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(source, detector, tx, settings, cancel_token.clone()));
        info!(interval = ?settings.interval, "sampler started");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("sampler task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for SamplerController {
    fn default() -> Self {
        Self::new()
    }
}
