//! Module registry: a closed set of keys mapped to descriptors.
//!
//! `descriptor` is the single dispatch point; everything that needs to know
//! what a module does matches on its `ModuleConfig`.

use serde::Serialize;

use crate::config::Prompts;
use crate::domain::ModuleKey;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleConfig {
  Welcome,
  Course,
  /// Single-shot text. `None` uses the service's default persona.
  Text { system_instruction: Option<String> },
  /// Single-shot image; the style prefix is prepended to the learner's prompt.
  Image { style_prefix: String },
  Story { persona: String, greeting: String },
  Code { system_instruction: String },
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ModuleDescriptor {
  pub key: ModuleKey,
  pub title: &'static str,
  pub description: &'static str,
  pub config: ModuleConfig,
}

pub fn descriptor(key: ModuleKey, prompts: &Prompts) -> ModuleDescriptor {
  let (title, description, config) = match key {
    ModuleKey::Welcome => (
      "Welcome!",
      "Get started on your AI Adventure.",
      ModuleConfig::Welcome,
    ),
    ModuleKey::PromptEngineeringCourse => (
      "Prompt Course",
      "Learn the secrets to talking with AI!",
      ModuleConfig::Course,
    ),
    ModuleKey::PromptingFun => (
      "Prompt Sandbox",
      "Practice talking to an AI. Ask it a question or give it a command.",
      ModuleConfig::Text { system_instruction: None },
    ),
    ModuleKey::ImageMagic => (
      "Image Magic",
      "Turn your words into pictures! Describe something you imagine, and the AI will draw it for you.",
      ModuleConfig::Image { style_prefix: prompts.image_magic_style.clone() },
    ),
    ModuleKey::StoryTime => (
      "Story Time",
      "Let's write a story together. You start with an idea, and we'll take turns building an adventure!",
      ModuleConfig::Story { persona: prompts.story_system.clone(), greeting: prompts.story_greeting.clone() },
    ),
    ModuleKey::ArtStudio => (
      "Art Studio",
      "Become a digital artist! Create art in different styles like cartoon, watercolor, or pixel art.",
      ModuleConfig::Image { style_prefix: prompts.art_studio_style.clone() },
    ),
    ModuleKey::CodeWizards => (
      "Code Wizards",
      "Ever wanted to speak computer language? Ask the AI to write simple code snippets for you!",
      ModuleConfig::Code { system_instruction: prompts.code_wizard_system.clone() },
    ),
    ModuleKey::SchoolHelper => (
      "School Helper",
      "Got a tricky school question? The AI can help explain topics, brainstorm for projects, or summarize text.",
      ModuleConfig::Text { system_instruction: Some(prompts.school_helper_system.clone()) },
    ),
  };
  ModuleDescriptor { key, title, description, config }
}

/// The sidebar, in display order.
pub fn all_modules(prompts: &Prompts) -> Vec<ModuleDescriptor> {
  ModuleKey::ALL.iter().map(|k| descriptor(*k, prompts)).collect()
}

/// Full image prompt as sent to the service.
pub fn styled_prompt(style_prefix: &str, prompt: &str) -> String {
  format!("{}: {}", style_prefix, prompt.trim())
}
