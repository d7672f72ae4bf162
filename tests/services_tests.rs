use emotive::capture::{encode_jpeg, fit_frame, BlankFrameSource, FrameSource, StillImageSource};
use emotive::config::AppConfig;
use emotive::error::ConfigError;
use emotive::series::Emotion;
use emotive::services::detector::DetectionResponse;
use emotive::services::llm::{system_prompt, ChatService};
use emotive::session::Session;
use image::GenericImageView;
use std::collections::HashMap;
use std::time::Duration;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_detection_response_normalizes_labels() {
    let body = r#"{
        "emotion": "happy",
        "confidence": 0.87,
        "all_emotions": { "happy": 0.87, "sad": 0.05, "Neutral": 0.06, "contempt": 0.5, "fear": 1.4 },
        "model": "fast_custom"
    }"#;
    let response: DetectionResponse = serde_json::from_str(body).unwrap();
    let detection = response.normalize().unwrap();

    assert_eq!(detection.emotion, Emotion::Happy);
    assert_eq!(detection.confidence, 0.87);
    assert_eq!(detection.scores.get(Emotion::Sad), 0.05);
    assert_eq!(detection.scores.get(Emotion::Neutral), 0.06);
    assert_eq!(detection.scores.get(Emotion::Fear), 1.0, "scores are clamped");
    assert_eq!(detection.scores.get(Emotion::Angry), 0.0, "missing labels default to zero");

    let observation = detection.into_observation(1234);
    assert_eq!(observation.timestamp, 1234);
    assert!(observation.validate().is_ok());
}

#[test]
fn test_detection_error_body_is_a_failure() {
    let body = r#"{ "emotion": "neutral", "confidence": 0.0, "error": "no face", "model": "error" }"#;
    let response: DetectionResponse = serde_json::from_str(body).unwrap();
    let err = response.normalize().unwrap_err();
    assert!(err.to_string().contains("no face"));
}

#[test]
fn test_detection_unknown_dominant_label_maps_to_neutral() {
    let body = r#"{ "emotion": "contempt", "confidence": 0.4 }"#;
    let detection = serde_json::from_str::<DetectionResponse>(body)
        .unwrap()
        .normalize()
        .unwrap();
    assert_eq!(detection.emotion, Emotion::Neutral);
    assert_eq!(detection.scores.iter().map(|(_, v)| v).sum::<f64>(), 0.0);
}

#[test]
fn test_system_prompts_follow_emotion() {
    assert!(system_prompt(Emotion::Angry).contains("frustrated or angry"));
    assert!(system_prompt(Emotion::Fear).contains("worried or anxious"));
    assert!(system_prompt(Emotion::Neutral).contains("calm and focused"));
    for emotion in Emotion::ALL {
        assert!(system_prompt(emotion).ends_with("unless more detail is specifically needed."));
    }
}

#[tokio::test]
async fn test_chat_without_key_falls_back_to_apology() {
    let service = ChatService::new(&AppConfig::default());
    let reply = service.reply("hello there", Emotion::Sad).await;

    assert_eq!(reply.emotion_detected, Emotion::Sad);
    assert!(reply.response.starts_with("I apologize, but I encountered an error:"));
    assert!(reply.response.ends_with("Please try again."));
    assert!(reply.error.unwrap().contains("OPENAI_API_KEY"));
}

#[test]
fn test_config_defaults() {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config.sample_interval, Duration::from_secs(3));
    assert_eq!(config.detector_url, "http://localhost:8000");
    assert_eq!(config.llm_model, "gpt-4o-mini");
    assert!(config.api_key.is_none());
    assert!(config.frame_path.is_none());
}

#[test]
fn test_config_overrides() {
    let config = AppConfig::from_lookup(lookup(&[
        ("EMOTION_DETECTOR_URL", "http://detector:9000/"),
        ("SAMPLE_INTERVAL_MS", "1500"),
        ("OPENAI_API_KEY", "sk-test"),
        ("LLM_MODEL", "  "),
        ("EXPORT_DIR", "/tmp/exports"),
    ]))
    .unwrap();

    assert_eq!(config.detector_url, "http://detector:9000");
    assert_eq!(config.sample_interval, Duration::from_millis(1500));
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.llm_model, "gpt-4o-mini", "blank values keep defaults");
    assert_eq!(config.export_dir, std::path::PathBuf::from("/tmp/exports"));
}

#[test]
fn test_config_rejects_bad_intervals() {
    let err = AppConfig::from_lookup(lookup(&[("SAMPLE_INTERVAL_MS", "3s")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMillis { key: "SAMPLE_INTERVAL_MS", .. }));

    let err = AppConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_MS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroDuration { key: "REQUEST_TIMEOUT_MS" }));
}

#[test]
fn test_frame_sources() {
    let mut blank = BlankFrameSource::default();
    let frame = blank.capture().expect("blank frame");
    // JPEG SOI marker
    assert_eq!(&frame[..2], &[0xFF, 0xD8]);

    let mut missing = StillImageSource::new("/nonexistent/frame.png");
    assert!(missing.capture().is_none());

    let big = image::DynamicImage::new_rgb8(1280, 960);
    let fitted = fit_frame(big);
    assert_eq!((fitted.width(), fitted.height()), (640, 480));
    assert!(encode_jpeg(&fitted).is_some());
}

#[test]
fn test_still_image_source_reads_file() {
    let path = std::env::temp_dir().join(format!("emotive_frame_{}.png", std::process::id()));
    image::DynamicImage::new_rgb8(64, 48).save(&path).unwrap();

    let mut source = StillImageSource::new(&path);
    let frame = source.capture().expect("frame from file");
    assert_eq!(&frame[..2], &[0xFF, 0xD8]);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_session_tracks_current_emotion() {
    let dir = std::env::temp_dir().join(format!("emotive_session_{}", std::process::id()));
    let config = AppConfig {
        export_dir: dir.clone(),
        ..AppConfig::default()
    };
    let mut session = Session::new(&config);
    assert_eq!(session.current_emotion(), Emotion::Neutral);

    let scores = emotive::EmotionScores::default().with(Emotion::Surprise, 0.7).with(Emotion::Happy, 0.2);
    session
        .ingest(emotive::Observation::new(10, Emotion::Surprise, 0.7, scores))
        .unwrap();
    assert_eq!(session.current_emotion(), Emotion::Surprise);

    let summary = session.summary();
    assert_eq!(summary.records, 1);
    assert_eq!(summary.latest_top[0], (Emotion::Surprise, 0.7));
    assert_eq!(summary.latest_top[1], (Emotion::Happy, 0.2));
    assert_eq!(summary.dominant_counts.get(Emotion::Surprise), 1);

    let reply = session.chat("what's up?").await;
    assert_eq!(reply.emotion_detected, Emotion::Surprise);

    let path = session
        .export(emotive::series::ExportFormat::Structured)
        .unwrap();
    assert!(path.starts_with(&dir));
    assert!(path.extension().map_or(false, |e| e == "json"));

    session.clear();
    assert_eq!(session.store().size(), 0);
    assert_eq!(session.current_emotion(), Emotion::Neutral);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_chat_task_is_detached_from_session() {
    let config = AppConfig {
        export_dir: std::env::temp_dir(),
        ..AppConfig::default()
    };
    let mut session = Session::new(&config);
    let scores = emotive::EmotionScores::default().with(Emotion::Angry, 0.9);
    session
        .ingest(emotive::Observation::new(5, Emotion::Angry, 0.9, scores))
        .unwrap();

    let turn = tokio::spawn(session.chat_task("calm me down".to_string()));

    // The session stays usable while the chat turn is in flight
    session.clear();
    assert_eq!(session.current_emotion(), Emotion::Neutral);

    let reply = turn.await.unwrap();
    assert_eq!(reply.emotion_detected, Emotion::Angry, "tagged with the emotion at send time");
    assert!(reply.error.is_some());
}
