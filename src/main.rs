use emotive::capture::{BlankFrameSource, StillImageSource};
use emotive::config::AppConfig;
use emotive::sampler::{SamplerController, SamplerSettings};
use emotive::series::ExportFormat;
use emotive::services::detector::DetectorService;
use emotive::services::llm::ChatReply;
use emotive::session::Session;
use emotive::Emotion;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

enum Command {
    Stats,
    Export(ExportFormat),
    Clear,
    Quit,
    Chat(String),
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let cmd = match line {
            "/stats" => Command::Stats,
            "/export csv" => Command::Export(ExportFormat::Rows),
            "/export json" => Command::Export(ExportFormat::Structured),
            "/clear" => Command::Clear,
            "/quit" => Command::Quit,
            other if other.starts_with('/') => Command::Unknown(other.to_string()),
            other => Command::Chat(other.to_string()),
        };
        Some(cmd)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(detector = %config.detector_url, "Emotion session booting...");

    let mut session = Session::new(&config);
    let detector = Arc::new(DetectorService::new(&config));
    let (obs_tx, mut obs_rx) = mpsc::channel(32);
    let (reply_tx, mut reply_rx) = mpsc::channel::<ChatReply>(8);

    let mut sampler = SamplerController::new();
    let settings = SamplerSettings::from(&config);
    match &config.frame_path {
        Some(path) => sampler.start(StillImageSource::new(path), detector, obs_tx, settings)?,
        None => sampler.start(BlankFrameSource::default(), detector, obs_tx, settings)?,
    }

    println!("Type a message to chat. Commands: /stats /export csv /export json /clear /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(observation) = obs_rx.recv() => {
                match session.ingest(observation) {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        tracing::error!("session cannot continue: {}", e);
                        break;
                    }
                    Err(e) => tracing::warn!("observation rejected: {}", e),
                }
            }
            Some(reply) = reply_rx.recv() => {
                println!("[{}] {}", reply.emotion_detected, reply.response);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = Command::parse(&line) else { continue };
                match command {
                    Command::Stats => print_stats(&session),
                    Command::Export(format) => match session.export(format) {
                        Ok(path) => println!("Exported to {}", path.display()),
                        Err(e) => tracing::warn!("export failed: {}", e),
                    },
                    Command::Clear => {
                        session.clear();
                        println!("History cleared.");
                    }
                    Command::Quit => break,
                    Command::Unknown(cmd) => println!("Unknown command: {}", cmd),
                    Command::Chat(message) => {
                        let turn = session.chat_task(message);
                        let reply_tx = reply_tx.clone();
                        tokio::spawn(async move {
                            let _ = reply_tx.send(turn.await).await;
                        });
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sampler.stop().await?;
    Ok(())
}

fn print_stats(session: &Session) {
    let summary = session.summary();
    println!("Records: {}  Duration: {} ms", summary.records, summary.duration_ms);
    if let Some(latest) = &summary.latest {
        let top: Vec<String> = summary
            .latest_top
            .iter()
            .map(|(e, v)| format!("{} {:.0}%", e, v * 100.0))
            .collect();
        println!(
            "Latest: {} ({:.0}%)  Top: {}",
            latest.dominant_emotion,
            latest.confidence * 100.0,
            top.join(", ")
        );
    }
    for emotion in Emotion::ALL {
        println!(
            "  {:<9} avg {:>6.2}%  dominant x{}",
            emotion.title(),
            summary.averages.get(emotion) * 100.0,
            summary.dominant_counts.get(emotion)
        );
    }
}
