//! A learner session: the top-level application object.
//!
//! Owns course progress and the companion chat for its whole lifetime, and
//! exactly one mounted module instance. Selecting another module discards the
//! mounted instance; each mount gets a fresh instance id so that a reply
//! arriving for a discarded instance is recognised and dropped.
//!
//! Everything here is synchronous. `logic` performs the AI calls between a
//! `begin_*` and the matching `finish_*`, without holding the session lock.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::ai::AiService;
use crate::config::Prompts;
use crate::course::{CourseProgress, CourseView, QuizOutcome};
use crate::domain::{Lesson, ModuleKey};
use crate::generation::{GenerationCycle, GenerationOutput, GenerationTicket};
use crate::modules::{descriptor, styled_prompt, ModuleConfig};
use crate::render::{segment, CopyAck, Segment, SegmentKind};
use crate::transcript::{Completion, Conversation, Outbound};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CodeTab {
  #[default]
  Lesson,
  Practice,
}

/// State of the Code Wizards screen.
#[derive(Clone, Debug, Default)]
pub struct CodeWizard {
  pub tab: CodeTab,
  pub cycle: GenerationCycle,
  pub segments: Vec<Segment>,
  acks: Vec<CopyAck>,
}

impl CodeWizard {
  pub fn is_copied(&self, index: usize, now: Instant, ttl: Duration) -> bool {
    self.acks.get(index).is_some_and(|a| a.is_active(now, ttl))
  }
}

pub enum ModuleInstance {
  Welcome,
  Course(CourseView),
  Text { system_instruction: Option<String>, cycle: GenerationCycle },
  Image { style_prefix: String, cycle: GenerationCycle },
  Story(Conversation),
  Code { system_instruction: String, wizard: CodeWizard },
}

impl ModuleInstance {
  fn mount(key: ModuleKey, ai: &dyn AiService, prompts: &Prompts) -> Self {
    match descriptor(key, prompts).config {
      ModuleConfig::Welcome => ModuleInstance::Welcome,
      ModuleConfig::Course => ModuleInstance::Course(CourseView::new()),
      ModuleConfig::Text { system_instruction } => ModuleInstance::Text { system_instruction, cycle: GenerationCycle::new() },
      ModuleConfig::Image { style_prefix } => ModuleInstance::Image { style_prefix, cycle: GenerationCycle::new() },
      ModuleConfig::Story { persona, greeting } => ModuleInstance::Story(Conversation::start(ai, &persona, Some(greeting.as_str()))),
      ModuleConfig::Code { system_instruction } => ModuleInstance::Code { system_instruction, wizard: CodeWizard::default() },
    }
  }
}

/// What to ask the AI service for a single-shot module.
#[derive(Debug, PartialEq, Eq)]
pub enum GenerationRequest {
  Text { prompt: String, system_instruction: Option<String> },
  Image { prompt: String },
}

/// A single-shot request released from the session, to be finished later.
#[derive(Debug)]
pub struct PendingGeneration {
  pub instance: u64,
  pub ticket: GenerationTicket,
  pub request: GenerationRequest,
}

pub struct LearnerSession {
  pub id: Uuid,
  active: ModuleKey,
  instance_id: u64,
  instance: ModuleInstance,
  progress: CourseProgress,
  companion_open: bool,
  companion: Conversation,
}

impl LearnerSession {
  pub fn new(id: Uuid, ai: &dyn AiService, prompts: &Prompts, lesson_count: usize) -> Self {
    Self {
      id,
      active: ModuleKey::Welcome,
      instance_id: 0,
      instance: ModuleInstance::Welcome,
      progress: CourseProgress::new(lesson_count),
      companion_open: false,
      companion: Conversation::start(ai, &prompts.companion_system, Some(prompts.companion_greeting.as_str())),
    }
  }

  pub fn active_module(&self) -> ModuleKey {
    self.active
  }

  pub fn instance_id(&self) -> u64 {
    self.instance_id
  }

  pub fn instance(&self) -> &ModuleInstance {
    &self.instance
  }

  pub fn progress(&self) -> &CourseProgress {
    &self.progress
  }

  pub fn companion(&self) -> &Conversation {
    &self.companion
  }

  pub fn companion_open(&self) -> bool {
    self.companion_open
  }

  /// Mount a module. Re-selecting the active module keeps its state.
  pub fn select_module(&mut self, key: ModuleKey, ai: &dyn AiService, prompts: &Prompts) -> bool {
    if key == self.active {
      return false;
    }
    self.instance_id += 1;
    self.active = key;
    self.instance = ModuleInstance::mount(key, ai, prompts);
    debug!(target: "session", session = %self.id, module = %key, instance = self.instance_id, "Module mounted");
    true
  }

  // --- course ---

  pub fn select_lesson(&mut self, lessons: &[Lesson], index: usize) -> bool {
    match &mut self.instance {
      ModuleInstance::Course(view) => view.select_lesson(lessons, &self.progress, index),
      _ => false,
    }
  }

  pub fn choose_option(&mut self, lessons: &[Lesson], option: usize) -> bool {
    match &mut self.instance {
      ModuleInstance::Course(view) => view.choose_option(lessons, &self.progress, option),
      _ => false,
    }
  }

  pub fn submit_answer(&mut self, lessons: &[Lesson], option: Option<usize>) -> Option<QuizOutcome> {
    match &mut self.instance {
      ModuleInstance::Course(view) => view.submit_answer(lessons, &self.progress, option),
      _ => None,
    }
  }

  /// Unlock after a passed quiz. Progress is learner-wide, so this applies
  /// even if the learner has left the course in the meantime.
  pub fn record_pass(&mut self, lesson: usize) -> bool {
    self.progress.record_pass(lesson)
  }

  // --- single-shot generation ---

  pub fn begin_generation(&mut self, prompt: &str) -> Option<PendingGeneration> {
    let instance = self.instance_id;
    let (ticket, request) = match &mut self.instance {
      ModuleInstance::Text { system_instruction, cycle } => {
        let ticket = cycle.begin(prompt)?;
        (ticket, GenerationRequest::Text { prompt: prompt.to_string(), system_instruction: system_instruction.clone() })
      }
      ModuleInstance::Image { style_prefix, cycle } => {
        let ticket = cycle.begin(prompt)?;
        (ticket, GenerationRequest::Image { prompt: styled_prompt(style_prefix, prompt) })
      }
      ModuleInstance::Code { system_instruction, wizard } if wizard.tab == CodeTab::Practice => {
        let ticket = wizard.cycle.begin(prompt)?;
        wizard.segments.clear();
        wizard.acks.clear();
        (ticket, GenerationRequest::Text { prompt: prompt.to_string(), system_instruction: Some(system_instruction.clone()) })
      }
      _ => return None,
    };
    Some(PendingGeneration { instance, ticket, request })
  }

  /// Apply a generation outcome. Dropped when the instance has been discarded.
  pub fn finish_generation(&mut self, instance: u64, ticket: GenerationTicket, outcome: Result<GenerationOutput, String>) -> bool {
    if instance != self.instance_id {
      debug!(target: "session", session = %self.id, instance, current = self.instance_id, "Dropping generation result for a discarded module");
      return false;
    }
    match &mut self.instance {
      ModuleInstance::Text { cycle, .. } | ModuleInstance::Image { cycle, .. } => cycle.finish(ticket, outcome),
      ModuleInstance::Code { wizard, .. } => {
        let segments = match &outcome {
          Ok(GenerationOutput::Text(text)) => segment(text),
          _ => Vec::new(),
        };
        if !wizard.cycle.finish(ticket, outcome) {
          return false;
        }
        wizard.acks = vec![CopyAck::default(); segments.len()];
        wizard.segments = segments;
        true
      }
      _ => false,
    }
  }

  // --- story chat ---

  pub fn begin_story_turn(&mut self, text: &str) -> Option<(u64, Outbound)> {
    let instance = self.instance_id;
    match &mut self.instance {
      ModuleInstance::Story(conversation) => conversation.submit_user_turn(text).map(|out| (instance, out)),
      _ => None,
    }
  }

  pub fn finish_story_turn(&mut self, instance: u64, completion: Completion, apology: &str) -> bool {
    if instance != self.instance_id {
      debug!(target: "session", session = %self.id, instance, current = self.instance_id, "Dropping story reply for a discarded module");
      return false;
    }
    match &mut self.instance {
      ModuleInstance::Story(conversation) => conversation.complete(completion, apology),
      _ => false,
    }
  }

  // --- companion chat ---

  pub fn set_companion_open(&mut self, open: bool) {
    self.companion_open = open;
  }

  pub fn begin_companion_turn(&mut self, text: &str) -> Option<Outbound> {
    self.companion.submit_user_turn(text)
  }

  pub fn finish_companion_turn(&mut self, completion: Completion, apology: &str) -> bool {
    self.companion.complete(completion, apology)
  }

  // --- code wizards ---

  pub fn set_code_tab(&mut self, tab: CodeTab) -> bool {
    match &mut self.instance {
      ModuleInstance::Code { wizard, .. } if wizard.tab != tab => {
        wizard.tab = tab;
        true
      }
      _ => false,
    }
  }

  /// Copy a code segment: returns its content verbatim and raises the ack flag.
  pub fn copy_code(&mut self, index: usize, now: Instant) -> Option<String> {
    let ModuleInstance::Code { wizard, .. } = &mut self.instance else { return None };
    let seg = wizard.segments.get(index).filter(|s| s.kind == SegmentKind::Code)?;
    let content = seg.content.clone();
    wizard.acks.get_mut(index)?.mark(now);
    Some(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::fake::FakeAi;
  use crate::generation::GenerationStatus;
  use crate::seeds::builtin_lessons;

  fn session(ai: &FakeAi) -> LearnerSession {
    LearnerSession::new(Uuid::new_v4(), ai, &Prompts::default(), builtin_lessons().len())
  }

  fn cycle(s: &LearnerSession) -> &GenerationCycle {
    match s.instance() {
      ModuleInstance::Text { cycle, .. } | ModuleInstance::Image { cycle, .. } => cycle,
      ModuleInstance::Code { wizard, .. } => &wizard.cycle,
      _ => panic!("not a generation module"),
    }
  }

  #[test]
  fn new_session_greets_with_companion_and_shows_welcome() {
    let ai = FakeAi::new();
    let s = session(&ai);
    assert_eq!(s.active_module(), ModuleKey::Welcome);
    assert!(!s.companion_open());
    assert_eq!(s.companion().turns().len(), 1);
    assert_eq!(s.progress().unlocked_count(), 1);
  }

  #[test]
  fn reselecting_active_module_keeps_instance() {
    let ai = FakeAi::new();
    let mut s = session(&ai);
    let prompts = Prompts::default();
    assert!(s.select_module(ModuleKey::PromptingFun, &ai, &prompts));
    let id = s.instance_id();
    s.begin_generation("hello").unwrap();
    assert!(!s.select_module(ModuleKey::PromptingFun, &ai, &prompts));
    assert_eq!(s.instance_id(), id);
    assert_eq!(cycle(&s).status(), GenerationStatus::Loading);
  }

  #[test]
  fn result_for_discarded_instance_is_dropped() {
    let ai = FakeAi::new();
    let prompts = Prompts::default();
    let mut s = session(&ai);
    s.select_module(ModuleKey::SchoolHelper, &ai, &prompts);
    let pending = s.begin_generation("photosynthesis?").unwrap();
    assert_eq!(
      pending.request,
      GenerationRequest::Text { prompt: "photosynthesis?".into(), system_instruction: Some(prompts.school_helper_system.clone()) }
    );

    s.select_module(ModuleKey::Welcome, &ai, &prompts);
    s.select_module(ModuleKey::SchoolHelper, &ai, &prompts);
    assert!(!s.finish_generation(pending.instance, pending.ticket, Ok(GenerationOutput::Text("late".into()))));
    assert_eq!(cycle(&s).status(), GenerationStatus::Idle);
  }

  #[test]
  fn image_modules_apply_their_style() {
    let ai = FakeAi::new();
    let prompts = Prompts::default();
    let mut s = session(&ai);
    s.select_module(ModuleKey::ArtStudio, &ai, &prompts);
    let pending = s.begin_generation("watercolor fox").unwrap();
    assert_eq!(pending.request, GenerationRequest::Image { prompt: format!("{}: watercolor fox", prompts.art_studio_style) });
  }

  #[test]
  fn course_progress_survives_leaving_the_course() {
    let ai = FakeAi::new();
    let prompts = Prompts::default();
    let lessons = builtin_lessons();
    let mut s = session(&ai);
    assert!(!s.select_lesson(&lessons, 0), "course not mounted");

    s.select_module(ModuleKey::PromptEngineeringCourse, &ai, &prompts);
    let outcome = s.submit_answer(&lessons, Some(2)).unwrap();
    let QuizOutcome::Correct { lesson, .. } = outcome else { panic!("expected correct") };

    s.select_module(ModuleKey::Welcome, &ai, &prompts);
    assert!(s.record_pass(lesson));
    s.select_module(ModuleKey::PromptEngineeringCourse, &ai, &prompts);
    assert!(s.select_lesson(&lessons, 1));
  }

  #[test]
  fn code_wizard_generates_only_from_practice_and_copies_code() {
    let ai = FakeAi::new();
    let prompts = Prompts::default();
    let mut s = session(&ai);
    s.select_module(ModuleKey::CodeWizards, &ai, &prompts);
    assert!(s.begin_generation("a guessing game").is_none(), "lesson tab");

    assert!(s.set_code_tab(CodeTab::Practice));
    let pending = s.begin_generation("say hello").unwrap();
    let reply = "Here you go:\n```python\nprint('hello')\n```\nEnjoy!";
    assert!(s.finish_generation(pending.instance, pending.ticket, Ok(GenerationOutput::Text(reply.into()))));

    let t0 = Instant::now();
    assert_eq!(s.copy_code(0, t0), None, "prose segment");
    assert_eq!(s.copy_code(1, t0).as_deref(), Some("print('hello')"));
    let ModuleInstance::Code { wizard, .. } = s.instance() else { panic!() };
    let ttl = Duration::from_millis(2000);
    assert!(wizard.is_copied(1, t0, ttl));
    assert!(!wizard.is_copied(1, t0 + ttl, ttl));
    assert_eq!(wizard.segments.len(), 3);
  }

  #[tokio::test]
  async fn story_reply_for_discarded_instance_is_dropped() {
    let ai = FakeAi::new().reply("The dragon sneezed!");
    let prompts = Prompts::default();
    let mut s = session(&ai);
    s.select_module(ModuleKey::StoryTime, &ai, &prompts);
    let (instance, out) = s.begin_story_turn("a dragon").unwrap();
    s.select_module(ModuleKey::Welcome, &ai, &prompts);
    s.select_module(ModuleKey::StoryTime, &ai, &prompts);

    let done = out.send().await;
    assert!(!s.finish_story_turn(instance, done, "sorry"));
    let ModuleInstance::Story(c) = s.instance() else { panic!() };
    assert_eq!(c.turns().len(), 1, "fresh story only has its greeting");
    assert_eq!(ai.chat_log()[0].0.as_deref(), Some(prompts.story_system.as_str()));
  }
}
