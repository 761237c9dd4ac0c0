//! The hosted generative-AI service, as seen by the rest of the backend.
//!
//! Three logical operations: single-shot text, single-shot image, and a
//! conversation handle that keeps its own context. `OpenAI` is the production
//! implementation; tests use the scripted fake below.

use async_trait::async_trait;

use crate::domain::ImageData;
use crate::error::AiError;

#[async_trait]
pub trait AiService: Send + Sync {
  /// Single-shot completion. `None` means the service's default persona.
  async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, AiError>;

  /// Single-shot image synthesis. `Ok(None)` means the service produced nothing.
  async fn generate_image(&self, prompt: &str) -> Result<Option<ImageData>, AiError>;

  /// Open a conversation bound to a persona for its whole lifetime.
  fn open_conversation(&self, system_instruction: Option<&str>) -> Box<dyn ChatSession>;
}

/// A live conversation. Callers only send the new message; earlier turns are
/// carried by the session itself.
#[async_trait]
pub trait ChatSession: Send {
  async fn send(&mut self, text: &str) -> Result<String, AiError>;
}

#[cfg(test)]
pub mod fake {
  //! Scripted stand-in for the AI service.

  use std::collections::VecDeque;
  use std::sync::{Arc, Mutex};

  use async_trait::async_trait;
  use tokio::sync::Semaphore;

  use super::{AiService, ChatSession};
  use crate::domain::ImageData;
  use crate::error::AiError;

  #[derive(Default)]
  struct Inner {
    replies: Mutex<VecDeque<Result<String, String>>>,
    images: Mutex<VecDeque<Option<ImageData>>>,
    prompts: Mutex<Vec<(String, Option<String>)>>,
    chat_log: Mutex<Vec<(Option<String>, Vec<String>)>>,
    gate: Option<Semaphore>,
  }

  /// Replies are consumed in order by text and chat calls alike. When gated,
  /// every call waits for `release()` before answering.
  #[derive(Clone, Default)]
  pub struct FakeAi {
    inner: Arc<Inner>,
  }

  impl FakeAi {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn gated() -> Self {
      Self { inner: Arc::new(Inner { gate: Some(Semaphore::new(0)), ..Default::default() }) }
    }

    pub fn reply(self, text: &str) -> Self {
      self.inner.replies.lock().unwrap().push_back(Ok(text.to_string()));
      self
    }

    pub fn fail(self) -> Self {
      self.inner.replies.lock().unwrap().push_back(Err("boom".into()));
      self
    }

    pub fn image(self, image: Option<ImageData>) -> Self {
      self.inner.images.lock().unwrap().push_back(image);
      self
    }

    pub fn release(&self) {
      if let Some(gate) = &self.inner.gate {
        gate.add_permits(1);
      }
    }

    /// Every single-shot prompt seen so far with its system instruction.
    pub fn prompts(&self) -> Vec<(String, Option<String>)> {
      self.inner.prompts.lock().unwrap().clone()
    }

    /// Every chat message sent, with the persona of its session and the
    /// history the session held when it was sent.
    pub fn chat_log(&self) -> Vec<(Option<String>, Vec<String>)> {
      self.inner.chat_log.lock().unwrap().clone()
    }

    async fn wait_gate(&self) {
      if let Some(gate) = &self.inner.gate {
        if let Ok(permit) = gate.acquire().await {
          permit.forget();
        }
      }
    }

    fn next_reply(&self) -> Result<String, AiError> {
      match self.inner.replies.lock().unwrap().pop_front() {
        Some(Ok(text)) => Ok(text),
        Some(Err(message)) => Err(AiError::Status { status: 500, message }),
        None => Err(AiError::Empty),
      }
    }
  }

  #[async_trait]
  impl AiService for FakeAi {
    async fn generate_text(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String, AiError> {
      self.inner.prompts.lock().unwrap().push((prompt.to_string(), system_instruction.map(str::to_string)));
      self.wait_gate().await;
      self.next_reply()
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<ImageData>, AiError> {
      self.inner.prompts.lock().unwrap().push((prompt.to_string(), None));
      self.wait_gate().await;
      Ok(self.inner.images.lock().unwrap().pop_front().flatten())
    }

    fn open_conversation(&self, system_instruction: Option<&str>) -> Box<dyn ChatSession> {
      Box::new(FakeChat {
        ai: self.clone(),
        persona: system_instruction.map(str::to_string),
        history: Vec::new(),
      })
    }
  }

  struct FakeChat {
    ai: FakeAi,
    persona: Option<String>,
    history: Vec<String>,
  }

  #[async_trait]
  impl ChatSession for FakeChat {
    async fn send(&mut self, text: &str) -> Result<String, AiError> {
      self.history.push(text.to_string());
      self.ai.inner.chat_log.lock().unwrap().push((self.persona.clone(), self.history.clone()));
      self.ai.wait_gate().await;
      match self.ai.next_reply() {
        Ok(reply) => {
          self.history.push(reply.clone());
          Ok(reply)
        }
        Err(e) => {
          self.history.pop();
          Err(e)
        }
      }
    }
  }
}
