use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::prompts::system_prompt;
use crate::config::AppConfig;
use crate::series::Emotion;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

#[derive(Clone)]
pub struct ChatService {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// What the user sees after sending a message. On failure `response`
/// holds an apology and `error` the cause.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub emotion_detected: Emotion,
    pub error: Option<String>,
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .unwrap_or_default(),
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub async fn complete(&self, message: &str, emotion: Emotion) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;

        let system = system_prompt(emotion);
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &system },
                ChatMessage { role: "user", content: message },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("LLM Server Error: {}", response.status()));
        }

        let resp_json: ChatCompletionResponse = response.json().await?;
        resp_json
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("LLM returned no content"))
    }

    /// Never fails: errors turn into an apology reply.
    pub async fn reply(&self, message: &str, emotion: Emotion) -> ChatReply {
        match self.complete(message, emotion).await {
            Ok(response) => ChatReply {
                response,
                emotion_detected: emotion,
                error: None,
            },
            Err(e) => {
                warn!("chat failed: {}", e);
                fallback_reply(emotion, &e.to_string())
            }
        }
    }
}

pub fn fallback_reply(emotion: Emotion, error: &str) -> ChatReply {
    ChatReply {
        response: format!(
            "I apologize, but I encountered an error: {}. Please try again.",
            error
        ),
        emotion_detected: emotion,
        error: Some(error.to_string()),
    }
}
