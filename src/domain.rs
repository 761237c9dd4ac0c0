//! Domain models shared across modules: turns, lessons, quizzes, module keys.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
  User,
  Ai,
}

/// One message in a conversation. Never edited after it is appended.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ConversationTurn {
  pub speaker: Speaker,
  pub text: String,
}

impl ConversationTurn {
  pub fn user(text: impl Into<String>) -> Self {
    Self { speaker: Speaker::User, text: text.into() }
  }

  pub fn ai(text: impl Into<String>) -> Self {
    Self { speaker: Speaker::Ai, text: text.into() }
  }
}

/// A multiple-choice question gating the next lesson.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quiz {
  pub question: String,
  pub options: Vec<String>,
  pub correct_option_index: usize,
  pub explanation: String,
}

impl Quiz {
  /// At least two options and a correct index that points at one of them.
  pub fn is_well_formed(&self) -> bool {
    self.options.len() >= 2 && self.correct_option_index < self.options.len()
  }
}

/// Renderable lesson content, kept free of markup so any client can lay it out.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum LessonBlock {
  Paragraph(String),
  /// A sample prompt the learner can try, shown highlighted.
  PromptExample(String),
  Steps(Vec<String>),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
  #[serde(default)]
  pub index: usize,
  pub title: String,
  pub content: Vec<LessonBlock>,
  #[serde(default)]
  pub quiz: Option<Quiz>,
}

/// Closed set of sidebar modules.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKey {
  Welcome,
  PromptEngineeringCourse,
  PromptingFun,
  ImageMagic,
  StoryTime,
  ArtStudio,
  CodeWizards,
  SchoolHelper,
}

impl ModuleKey {
  /// Sidebar order.
  pub const ALL: [ModuleKey; 8] = [
    ModuleKey::Welcome,
    ModuleKey::PromptEngineeringCourse,
    ModuleKey::PromptingFun,
    ModuleKey::ImageMagic,
    ModuleKey::StoryTime,
    ModuleKey::ArtStudio,
    ModuleKey::CodeWizards,
    ModuleKey::SchoolHelper,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ModuleKey::Welcome => "welcome",
      ModuleKey::PromptEngineeringCourse => "prompt_engineering_course",
      ModuleKey::PromptingFun => "prompting_fun",
      ModuleKey::ImageMagic => "image_magic",
      ModuleKey::StoryTime => "story_time",
      ModuleKey::ArtStudio => "art_studio",
      ModuleKey::CodeWizards => "code_wizards",
      ModuleKey::SchoolHelper => "school_helper",
    }
  }
}

impl std::fmt::Display for ModuleKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Generated image payload (raw bytes + mime), as returned by the AI service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
  pub mime: String,
  pub bytes: Vec<u8>,
}

impl ImageData {
  /// File extension matching the mime type, used for download names.
  pub fn extension(&self) -> &'static str {
    match self.mime.as_str() {
      "image/jpeg" | "image/jpg" => "jpeg",
      "image/webp" => "webp",
      _ => "png",
    }
  }
}
