//! Minimal OpenAI client for our use-cases.
//!
//! We call chat.completions (plain text, single-shot or with a running
//! history) and images.generations (base64 payloads). Calls are instrumented
//! and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::ai::{AiService, ChatSession};
use crate::domain::ImageData;
use crate::error::{AiError, ConfigError};

const CHAT_TEMPERATURE: f32 = 0.8;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub text_model: String,
  pub image_model: String,
  /// Persona applied when a caller gives none.
  pub default_system: String,
}

impl OpenAI {
  /// Construct the client from the environment. OPENAI_API_KEY is mandatory.
  pub fn from_env(default_system: &str) -> Result<Self, ConfigError> {
    let api_key = require_api_key(std::env::var("OPENAI_API_KEY").ok())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let text_model =
      std::env::var("OPENAI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let image_model =
      std::env::var("OPENAI_IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;

    Ok(Self {
      client,
      api_key,
      base_url,
      text_model,
      image_model,
      default_system: default_system.to_string(),
    })
  }

  fn system_or_default<'a>(&'a self, system: Option<&'a str>) -> &'a str {
    system.filter(|s| !s.trim().is_empty()).unwrap_or(&self.default_system)
  }

  /// Chat completion over an explicit message list. Returns the trimmed reply text.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.text_model, messages = messages.len()))]
  async fn chat(&self, messages: &[ChatMessageReq]) -> Result<String, AiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.text_model.clone(),
      messages,
      temperature: CHAT_TEMPERATURE,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "adventure-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(AiError::Status { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| AiError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default().trim().to_string();
    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "Chat completion received");

    if text.is_empty() { Err(AiError::Empty) } else { Ok(text) }
  }
}

#[async_trait]
impl AiService for OpenAI {
  #[instrument(level = "info", skip(self, prompt, system_instruction), fields(prompt_len = prompt.len(), has_system = system_instruction.is_some()))]
  async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, AiError> {
    let messages = [
      ChatMessageReq::system(self.system_or_default(system_instruction)),
      ChatMessageReq::user(prompt),
    ];
    self.chat(&messages).await
  }

  #[instrument(level = "info", skip(self, prompt), fields(model = %self.image_model, prompt_len = prompt.len()))]
  async fn generate_image(&self, prompt: &str) -> Result<Option<ImageData>, AiError> {
    let url = format!("{}/images/generations", self.base_url);
    let req = ImageRequest {
      model: &self.image_model,
      prompt,
      n: 1,
      size: "1024x1024",
      response_format: "b64_json",
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "adventure-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(AiError::Status { status: status.as_u16(), message });
    }

    let body: ImageResponse = res.json().await.map_err(|e| AiError::Decode(e.to_string()))?;
    let Some(b64) = body.data.into_iter().find_map(|d| d.b64_json) else {
      info!(elapsed = ?start.elapsed(), "Image generation returned no images");
      return Ok(None);
    };
    let bytes = base64::engine::general_purpose::STANDARD
      .decode(b64.trim())
      .map_err(|e| AiError::Decode(e.to_string()))?;
    info!(elapsed = ?start.elapsed(), bytes = bytes.len(), "Image generated");
    Ok(Some(ImageData { mime: "image/png".into(), bytes }))
  }

  fn open_conversation(&self, system_instruction: Option<&str>) -> Box<dyn ChatSession> {
    let system = self.system_or_default(system_instruction).to_string();
    Box::new(OpenAIChat { client: self.clone(), messages: vec![ChatMessageReq::system(&system)] })
  }
}

/// Conversation over chat.completions. The API is stateless, so the session
/// keeps the transcript and replays it on each call.
pub struct OpenAIChat {
  client: OpenAI,
  messages: Vec<ChatMessageReq>,
}

#[async_trait]
impl ChatSession for OpenAIChat {
  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), history = self.messages.len()))]
  async fn send(&mut self, text: &str) -> Result<String, AiError> {
    self.messages.push(ChatMessageReq::user(text));
    match self.client.chat(&self.messages).await {
      Ok(reply) => {
        self.messages.push(ChatMessageReq::assistant(&reply));
        Ok(reply)
      }
      Err(e) => {
        // Keep history consistent with what the model has actually answered.
        self.messages.pop();
        error!(error = %e, "Chat turn failed");
        Err(e)
      }
    }
  }
}

/// The credential is mandatory; absent and blank values are both fatal.
fn require_api_key(raw: Option<String>) -> Result<String, ConfigError> {
  raw.filter(|k| !k.trim().is_empty()).ok_or(ConfigError::MissingApiKey)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: String,
  messages: &'a [ChatMessageReq],
  temperature: f32,
}
#[derive(Clone, Serialize)]
struct ChatMessageReq { role: &'static str, content: String }

impl ChatMessageReq {
  fn system(content: &str) -> Self { Self { role: "system", content: content.into() } }
  fn user(content: &str) -> Self { Self { role: "user", content: content.into() } }
  fn assistant(content: &str) -> Self { Self { role: "assistant", content: content.into() } }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

// --- Image DTOs ---

#[derive(Serialize)]
struct ImageRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  n: u8,
  size: &'a str,
  response_format: &'a str,
}
#[derive(Deserialize)]
struct ImageResponse {
  #[serde(default)] data: Vec<ImageDatum>,
}
#[derive(Deserialize)]
struct ImageDatum {
  #[serde(default)] b64_json: Option<String>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client() -> OpenAI {
    OpenAI {
      client: reqwest::Client::new(),
      api_key: "test".into(),
      base_url: "http://localhost".into(),
      text_model: "m".into(),
      image_model: "i".into(),
      default_system: "be kind".into(),
    }
  }

  #[test]
  fn error_body_message_is_extracted() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_openai_error("<html>"), None);
  }

  #[test]
  fn blank_system_falls_back_to_default_persona() {
    let oa = client();
    assert_eq!(oa.system_or_default(None), "be kind");
    assert_eq!(oa.system_or_default(Some("  ")), "be kind");
    assert_eq!(oa.system_or_default(Some("pirate")), "pirate");
  }

  #[test]
  fn chat_request_serializes_roles_in_order() {
    let messages = [ChatMessageReq::system("s"), ChatMessageReq::user("u"), ChatMessageReq::assistant("a")];
    let req = ChatCompletionRequest { model: "m".into(), messages: &messages, temperature: 0.5 };
    let v = serde_json::to_value(&req).expect("json");
    let roles: Vec<&str> = v["messages"].as_array().unwrap().iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["system", "user", "assistant"]);
  }

  #[test]
  fn missing_or_blank_key_is_fatal() {
    assert!(matches!(require_api_key(None), Err(ConfigError::MissingApiKey)));
    assert!(matches!(require_api_key(Some("  \n".into())), Err(ConfigError::MissingApiKey)));
    assert_eq!(require_api_key(Some("sk-abc".into())).unwrap(), "sk-abc");
  }

  // The only test that touches OPENAI_API_KEY; restores the prior value.
  #[test]
  fn from_env_refuses_to_start_without_key() {
    let saved = std::env::var("OPENAI_API_KEY").ok();
    std::env::remove_var("OPENAI_API_KEY");
    let unset = OpenAI::from_env("p");
    std::env::set_var("OPENAI_API_KEY", "   ");
    let blank = OpenAI::from_env("p");
    match saved {
      Some(v) => std::env::set_var("OPENAI_API_KEY", v),
      None => std::env::remove_var("OPENAI_API_KEY"),
    }
    assert!(matches!(unset, Err(ConfigError::MissingApiKey)));
    assert!(matches!(blank, Err(ConfigError::MissingApiKey)));
  }
}
