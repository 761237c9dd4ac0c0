//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Every operation locks the learner session only for its synchronous state
//! change. AI calls happen between `begin_*` and `finish_*` with the lock
//! released, so a second request against the same module sees it pending
//! and is rejected as a no-op. The AI call and its `finish_*` run as a task
//! of their own: a caller that goes away never leaves a module pending.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::course::QuizOutcome;
use crate::domain::{ImageData, ModuleKey};
use crate::error::ApiError;
use crate::generation::GenerationOutput;
use crate::protocol::{to_session_out, ActionOut, CopyOut, SessionOut};
use crate::session::{CodeTab, GenerationRequest, LearnerSession, ModuleInstance};
use crate::state::{AppState, SharedSession};
use crate::util::trunc_for_log;

fn snapshot_of(state: &AppState, s: &LearnerSession) -> SessionOut {
  to_session_out(s, &state.lessons, &state.prompts, &state.timing, Instant::now())
}

/// Run a synchronous change against a session and return its result with a fresh snapshot.
async fn with_session<R>(
  state: &AppState,
  id: Uuid,
  f: impl FnOnce(&mut LearnerSession, &AppState) -> R,
) -> Result<(R, SessionOut), ApiError> {
  let shared = state.get_session(id).await?;
  let mut s = shared.lock().await;
  let r = f(&mut *s, state);
  Ok((r, snapshot_of(state, &s)))
}

async fn action(
  state: &AppState,
  id: Uuid,
  f: impl FnOnce(&mut LearnerSession, &AppState) -> bool,
) -> Result<ActionOut, ApiError> {
  let (accepted, session) = with_session(state, id, f).await?;
  Ok(ActionOut { accepted, session })
}

/// Spawn the remainder of an AI-bearing operation and wait for its snapshot.
/// Dropping the returned future does not cancel the task.
async fn detached(work: impl Future<Output = SessionOut> + Send + 'static) -> Result<SessionOut, ApiError> {
  tokio::spawn(work).await.map_err(|e| {
    error!(target: "adventure_backend", error = %e, "Background AI task failed");
    ApiError::Internal(e.to_string())
  })
}

async fn snapshot_shared(state: &AppState, shared: &SharedSession) -> SessionOut {
  let s = shared.lock().await;
  snapshot_of(state, &s)
}

#[instrument(level = "info", skip(state))]
pub async fn create_session(state: &AppState) -> SessionOut {
  let shared = state.create_session().await;
  snapshot_shared(state, &shared).await
}

pub async fn get_session(state: &AppState, id: Uuid) -> Result<SessionOut, ApiError> {
  let shared = state.get_session(id).await?;
  Ok(snapshot_shared(state, &shared).await)
}

#[instrument(level = "info", skip(state), fields(%id, %module))]
pub async fn select_module(state: &AppState, id: Uuid, module: ModuleKey) -> Result<ActionOut, ApiError> {
  action(state, id, |s, st| s.select_module(module, st.ai.as_ref(), &st.prompts)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn select_lesson(state: &AppState, id: Uuid, index: usize) -> Result<ActionOut, ApiError> {
  action(state, id, |s, st| s.select_lesson(&st.lessons, index)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn choose_option(state: &AppState, id: Uuid, index: usize) -> Result<ActionOut, ApiError> {
  action(state, id, |s, st| s.choose_option(&st.lessons, index)).await
}

/// Check a quiz answer. A correct answer unlocks the next lesson after the
/// configured delay, in the background.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn submit_answer(state: &AppState, id: Uuid, index: Option<usize>) -> Result<ActionOut, ApiError> {
  let shared = state.get_session(id).await?;
  let (outcome, session) = {
    let mut s = shared.lock().await;
    let outcome = s.submit_answer(&state.lessons, index);
    (outcome, snapshot_of(state, &s))
  };

  match &outcome {
    Some(QuizOutcome::Correct { lesson, .. }) => {
      info!(target: "course", %id, lesson, "Quiz passed; unlocking after delay");
      schedule_unlock(shared, *lesson, state.timing.quiz_pass_delay());
    }
    Some(QuizOutcome::Incorrect { chosen, correct_option_index }) => {
      info!(target: "course", %id, chosen, correct_option_index, "Quiz answered incorrectly");
    }
    None => debug!(target: "course", %id, "Quiz submission rejected"),
  }
  Ok(ActionOut { accepted: outcome.is_some(), session })
}

fn schedule_unlock(shared: SharedSession, lesson: usize, delay: Duration) {
  tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    let mut s = shared.lock().await;
    if s.record_pass(lesson) {
      info!(target: "course", id = %s.id, lesson, unlocked = s.progress().unlocked_count(), "Lesson unlocked");
    }
  });
}

/// Submit a prompt to the active single-shot module and wait for the outcome.
#[instrument(level = "info", skip(state, prompt), fields(%id, prompt_len = prompt.len()))]
pub async fn generate(state: &AppState, id: Uuid, prompt: &str) -> Result<ActionOut, ApiError> {
  let shared = state.get_session(id).await?;
  let pending = {
    let mut s = shared.lock().await;
    match s.begin_generation(prompt) {
      Some(p) => p,
      None => {
        debug!(target: "generation", %id, "Generation rejected (blank prompt, busy, or no generation module)");
        return Ok(ActionOut { accepted: false, session: snapshot_of(state, &s) });
      }
    }
  };

  let state = state.clone();
  let session = detached(async move {
    let outcome = run_generation(&state, &pending.request).await;
    let mut s = shared.lock().await;
    s.finish_generation(pending.instance, pending.ticket, outcome);
    snapshot_of(&state, &s)
  })
  .await?;
  Ok(ActionOut { accepted: true, session })
}

/// Call the AI service. Failures become the learner-facing fallback message.
async fn run_generation(state: &AppState, request: &GenerationRequest) -> Result<GenerationOutput, String> {
  match request {
    GenerationRequest::Text { prompt, system_instruction } => {
      match state.ai.generate_text(prompt, system_instruction.as_deref()).await {
        Ok(text) => Ok(GenerationOutput::Text(text)),
        Err(e) => {
          error!(target: "generation", error = %e, prompt = %trunc_for_log(prompt, 80), "Text generation failed; using fallback");
          Err(state.prompts.text_fallback.clone())
        }
      }
    }
    GenerationRequest::Image { prompt } => match state.ai.generate_image(prompt).await {
      Ok(Some(image)) => Ok(GenerationOutput::Image(image)),
      Ok(None) => {
        error!(target: "generation", prompt = %trunc_for_log(prompt, 80), "Image generation returned nothing");
        Err(state.prompts.image_fallback.clone())
      }
      Err(e) => {
        error!(target: "generation", error = %e, prompt = %trunc_for_log(prompt, 80), "Image generation failed");
        Err(state.prompts.image_fallback.clone())
      }
    },
  }
}

#[instrument(level = "info", skip(state, text), fields(%id, text_len = text.len()))]
pub async fn story_message(state: &AppState, id: Uuid, text: &str) -> Result<ActionOut, ApiError> {
  let shared = state.get_session(id).await?;
  let (instance, outbound) = {
    let mut s = shared.lock().await;
    match s.begin_story_turn(text) {
      Some(pair) => pair,
      None => return Ok(ActionOut { accepted: false, session: snapshot_of(state, &s) }),
    }
  };

  let state = state.clone();
  let session = detached(async move {
    let done = outbound.send().await;
    debug!(target: "conversation", %id, ok = done.is_ok(), "Story turn answered");
    let mut s = shared.lock().await;
    s.finish_story_turn(instance, done, &state.prompts.text_fallback);
    snapshot_of(&state, &s)
  })
  .await?;
  Ok(ActionOut { accepted: true, session })
}

#[instrument(level = "info", skip(state, text), fields(%id, text_len = text.len()))]
pub async fn companion_message(state: &AppState, id: Uuid, text: &str) -> Result<ActionOut, ApiError> {
  let shared = state.get_session(id).await?;
  let outbound = {
    let mut s = shared.lock().await;
    match s.begin_companion_turn(text) {
      Some(out) => out,
      None => return Ok(ActionOut { accepted: false, session: snapshot_of(state, &s) }),
    }
  };

  let state = state.clone();
  let session = detached(async move {
    let done = outbound.send().await;
    debug!(target: "conversation", %id, ok = done.is_ok(), "Companion turn answered");
    let mut s = shared.lock().await;
    s.finish_companion_turn(done, &state.prompts.text_fallback);
    snapshot_of(&state, &s)
  })
  .await?;
  Ok(ActionOut { accepted: true, session })
}

pub async fn set_companion_open(state: &AppState, id: Uuid, open: bool) -> Result<ActionOut, ApiError> {
  action(state, id, |s, _| {
    let changed = s.companion_open() != open;
    s.set_companion_open(open);
    changed
  })
  .await
}

pub async fn set_code_tab(state: &AppState, id: Uuid, tab: CodeTab) -> Result<ActionOut, ApiError> {
  action(state, id, |s, _| s.set_code_tab(tab)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn copy_code(state: &AppState, id: Uuid, segment: usize) -> Result<CopyOut, ApiError> {
  let (content, session) = with_session(state, id, |s, _| s.copy_code(segment, Instant::now())).await?;
  Ok(CopyOut { content, session })
}

/// The image of the mounted image module. `instance` pins the request to one mount.
pub async fn current_image(state: &AppState, id: Uuid, instance: Option<u64>) -> Result<ImageData, ApiError> {
  let shared = state.get_session(id).await?;
  let s = shared.lock().await;
  if instance.is_some_and(|i| i != s.instance_id()) {
    return Err(ApiError::NotFound("image belongs to a closed module".into()));
  }
  match s.instance() {
    ModuleInstance::Image { cycle, .. } => cycle.image().cloned().ok_or_else(|| ApiError::NotFound("no image yet".into())),
    _ => Err(ApiError::NotFound("no image module open".into())),
  }
}
