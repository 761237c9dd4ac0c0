//! Loading app configuration (personas, fallback messages, timings, optional
//! lesson set) from TOML.
//!
//! See `AppConfig`, `Prompts` and `Timing` for expected schema. Every field has
//! a default, so an empty file (or no file at all) is a valid configuration.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Lesson;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub timing: Timing,
  /// Replaces the built-in course when non-empty.
  #[serde(default)]
  pub lessons: Vec<Lesson>,
}

/// Personas, greetings and user-facing fallback texts. Defaults are tuned for kids aged 8-12.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Used whenever a request carries no system instruction of its own.
  pub default_system: String,
  pub school_helper_system: String,
  pub code_wizard_system: String,

  pub story_system: String,
  pub story_greeting: String,
  pub companion_system: String,
  pub companion_greeting: String,

  pub image_magic_style: String,
  pub art_studio_style: String,

  pub text_fallback: String,
  pub image_fallback: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      default_system: "You are a friendly, encouraging, and fun AI assistant for kids aged 8-12. Explain things simply, use positive language, and make learning exciting. Keep your answers concise and easy to understand.".into(),
      school_helper_system: "You are a helpful and patient school tutor for kids. Explain concepts clearly and simply, as if you were explaining to a 10-year-old. Be encouraging and break down complex ideas into small, easy-to-digest parts.".into(),
      code_wizard_system: "You are a helpful coding assistant for kids. You provide very simple, easy-to-understand code examples in Python or JavaScript, with clear explanations of what each line does. Always wrap code in markdown code blocks using ```.".into(),
      story_system: "You are a master storyteller for kids. Start a fun, adventurous, and slightly silly story based on the user's prompt. After each part you write, end with an engaging question like 'What should happen next?' or 'Who do they meet now?'. Keep your story parts to 2-3 paragraphs.".into(),
      story_greeting: "Tell me what our story should be about! How about a brave knight, a silly dragon, or a magical unicorn?".into(),
      companion_system: "You are Gemi, a super friendly and curious AI robot friend for kids. Your goal is to be a supportive and fun companion. You love jokes, fun facts, and asking kids about their day. You are NOT a tutor, just a friend to chat with. Keep your responses short, cheerful, and use lots of emojis! 🤖✨".into(),
      companion_greeting: "Hi there! I'm Gemi! What are you up to today? Wanna hear a joke? 😄".into(),
      image_magic_style: "A vibrant, kid-friendly, cartoon-style image of".into(),
      art_studio_style: "An artistic, kid-friendly image in the style of".into(),
      text_fallback: "Oops! Something went wrong. I couldn't think of anything right now. Maybe try asking again?".into(),
      image_fallback: "Oh no! My digital paintbrush slipped. Could you try a different idea?".into(),
    }
  }
}

/// Display timers. None of these affect correctness, only pacing.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
  /// How long the "correct!" feedback stays before the next lesson unlocks.
  pub quiz_pass_delay_ms: u64,
  /// How long a copied code block shows its acknowledgment.
  pub copy_ack_ms: u64,
  pub chat_reveal_tick_ms: u64,
  pub text_reveal_tick_ms: u64,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      quiz_pass_delay_ms: 1500,
      copy_ack_ms: 2000,
      chat_reveal_tick_ms: 30,
      text_reveal_tick_ms: 50,
    }
  }
}

impl Timing {
  pub fn quiz_pass_delay(&self) -> Duration {
    Duration::from_millis(self.quiz_pass_delay_ms)
  }

  pub fn copy_ack(&self) -> Duration {
    Duration::from_millis(self.copy_ack_ms)
  }
}

impl AppConfig {
  /// Parse a TOML document. Lessons with a malformed quiz are dropped and
  /// the remaining ones are re-indexed in file order.
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    let mut cfg: AppConfig = toml::from_str(s)?;
    cfg.lessons.retain(|lesson| match &lesson.quiz {
      Some(q) if !q.is_well_formed() => {
        error!(target: "course", title = %lesson.title, "Skipping lesson: quiz needs >= 2 options and a valid correct index.");
        false
      }
      _ => true,
    });
    for (i, lesson) in cfg.lessons.iter_mut().enumerate() {
      lesson.index = i;
    }
    Ok(cfg)
  }
}

/// Attempt to load `AppConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match AppConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "adventure_backend", %path, lessons = cfg.lessons.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "adventure_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "adventure_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = AppConfig::from_toml_str("").expect("parse");
    assert_eq!(cfg.timing.quiz_pass_delay_ms, 1500);
    assert_eq!(cfg.timing.copy_ack_ms, 2000);
    assert!(cfg.lessons.is_empty());
    assert!(cfg.prompts.story_greeting.contains("brave knight"));
  }

  #[test]
  fn partial_prompts_keep_other_defaults() {
    let cfg = AppConfig::from_toml_str(
      r#"
      [prompts]
      companion_greeting = "Hello friend!"

      [timing]
      quiz_pass_delay_ms = 10
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.prompts.companion_greeting, "Hello friend!");
    assert!(cfg.prompts.companion_system.starts_with("You are Gemi"));
    assert_eq!(cfg.timing.quiz_pass_delay_ms, 10);
    assert_eq!(cfg.timing.copy_ack_ms, 2000);
  }

  #[test]
  fn malformed_lessons_are_skipped_and_reindexed() {
    let cfg = AppConfig::from_toml_str(
      r#"
      [[lessons]]
      title = "Broken"
      content = [{ kind = "paragraph", text = "x" }]
      [lessons.quiz]
      question = "?"
      options = ["only one"]
      correct_option_index = 0
      explanation = ""

      [[lessons]]
      title = "Fine"
      content = [{ kind = "prompt_example", text = "Draw a cat" }]
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.lessons.len(), 1);
    assert_eq!(cfg.lessons[0].title, "Fine");
    assert_eq!(cfg.lessons[0].index, 0);
    assert!(cfg.lessons[0].quiz.is_none());
  }
}
