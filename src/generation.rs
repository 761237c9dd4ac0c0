//! Single-shot generation cycle: IDLE → LOADING → SUCCESS | ERROR.
//!
//! One request may be in flight per cycle. `begin` hands out a ticket and
//! `finish` applies exactly one outcome for that ticket; anything else is
//! ignored. There is no retry: the learner resubmits by hand.

use serde::Serialize;
use tracing::debug;

use crate::domain::ImageData;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
  #[default]
  Idle,
  Loading,
  Success,
  Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutput {
  Text(String),
  Image(ImageData),
}

#[derive(Debug, PartialEq, Eq)]
pub struct GenerationTicket(u64);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationCycle {
  prompt: String,
  status: GenerationStatus,
  result: Option<GenerationOutput>,
  error_message: Option<String>,
  in_flight: Option<u64>,
  next_ticket: u64,
}

impl GenerationCycle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn prompt(&self) -> &str {
    &self.prompt
  }

  pub fn status(&self) -> GenerationStatus {
    self.status
  }

  pub fn result(&self) -> Option<&GenerationOutput> {
    self.result.as_ref()
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error_message.as_deref()
  }

  pub fn image(&self) -> Option<&ImageData> {
    match &self.result {
      Some(GenerationOutput::Image(img)) => Some(img),
      _ => None,
    }
  }

  /// Start a request. Blank prompts and submissions while loading are rejected no-ops.
  pub fn begin(&mut self, prompt: &str) -> Option<GenerationTicket> {
    if prompt.trim().is_empty() || self.status == GenerationStatus::Loading {
      return None;
    }
    let id = self.next_ticket;
    self.next_ticket += 1;
    self.prompt = prompt.to_string();
    self.status = GenerationStatus::Loading;
    self.result = None;
    self.error_message = None;
    self.in_flight = Some(id);
    Some(GenerationTicket(id))
  }

  /// Apply the outcome of the request in flight. `Err` carries the learner-facing message.
  pub fn finish(&mut self, ticket: GenerationTicket, outcome: Result<GenerationOutput, String>) -> bool {
    if self.in_flight != Some(ticket.0) {
      debug!(target: "generation", ticket = ticket.0, "Ignoring outcome for a request that is not in flight");
      return false;
    }
    self.in_flight = None;
    match outcome {
      Ok(output) => {
        self.status = GenerationStatus::Success;
        self.result = Some(output);
      }
      Err(message) => {
        self.status = GenerationStatus::Error;
        self.error_message = Some(message);
      }
    }
    true
  }
}
