//! Public protocol structs for WebSocket and HTTP endpoints (serde ready),
//! plus the conversion of a learner session into its client snapshot.
//! Keep this small and stable to evolve backend and frontend independently.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Prompts, Timing};
use crate::course::{CourseProgress, CourseView, LessonState};
use crate::domain::{Lesson, LessonBlock, ModuleKey};
use crate::generation::{GenerationCycle, GenerationOutput, GenerationStatus};
use crate::modules::{descriptor, ModuleDescriptor};
use crate::render::SegmentKind;
use crate::seeds::{code_lesson, WELCOME_TEXT, WELCOME_TITLE};
use crate::session::{CodeTab, LearnerSession, ModuleInstance};
use crate::transcript::{Conversation, TurnView};

const QUIZ_CORRECT_FEEDBACK: &str = "Awesome! You got it right!";
const QUIZ_WRONG_FEEDBACK: &str = "Not quite, try the next lesson again! The correct answer is highlighted.";

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListModules,
    CreateSession,
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SelectModule {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        module: ModuleKey,
    },
    SelectLesson {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        index: usize,
    },
    ChooseOption {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        index: usize,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        #[serde(default)]
        index: Option<usize>,
    },
    Generate {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        prompt: String,
    },
    StoryMessage {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        text: String,
    },
    CompanionToggle {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        open: bool,
    },
    CompanionMessage {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        text: String,
    },
    CodeTab {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        tab: CodeTab,
    },
    CopyCode {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        segment: usize,
    },
}

impl ClientWsMessage {
    /// True for requests answered only after an AI round trip.
    pub fn awaits_ai(&self) -> bool {
        matches!(
            self,
            ClientWsMessage::Generate { .. }
                | ClientWsMessage::StoryMessage { .. }
                | ClientWsMessage::CompanionMessage { .. }
        )
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Modules {
        modules: Vec<ModuleDescriptor>,
    },
    Session {
        accepted: bool,
        session: SessionOut,
    },
    Copied {
        content: Option<String>,
        session: SessionOut,
    },
    Error {
        message: String,
    },
}

//
// Session snapshot
//

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: Uuid,
    pub active_module: ModuleKey,
    pub instance_id: u64,
    pub progress: ProgressOut,
    pub companion: CompanionOut,
    pub module: ModuleOut,
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub unlocked_count: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CompanionOut {
    pub open: bool,
    pub pending: bool,
    pub turns: Vec<TurnView>,
    pub reveal_tick_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ConversationOut {
    pub pending: bool,
    pub turns: Vec<TurnView>,
    pub reveal_tick_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleOut {
    Welcome {
        title: &'static str,
        text: &'static str,
    },
    Course(CourseOut),
    Text {
        title: &'static str,
        description: &'static str,
        generation: GenerationOut,
    },
    Image {
        title: &'static str,
        description: &'static str,
        generation: GenerationOut,
        /// Download link once an image is ready.
        image_url: Option<String>,
    },
    Story {
        title: &'static str,
        description: &'static str,
        conversation: ConversationOut,
    },
    Code {
        title: &'static str,
        description: &'static str,
        tab: CodeTab,
        lesson: Vec<LessonBlock>,
        generation: GenerationOut,
        segments: Vec<SegmentOut>,
    },
}

#[derive(Debug, Serialize)]
pub struct CourseOut {
    pub active_lesson: usize,
    pub lessons: Vec<LessonSummaryOut>,
    pub lesson: Option<Lesson>,
    pub quiz: Option<QuizOut>,
}

#[derive(Debug, Serialize)]
pub struct LessonSummaryOut {
    pub index: usize,
    pub title: String,
    pub state: LessonState,
}

#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub question: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub submitted: bool,
    /// Revealed only after the attempt is checked.
    pub correct: Option<bool>,
    pub correct_option_index: Option<usize>,
    pub feedback: Option<&'static str>,
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationOut {
    pub prompt: String,
    pub status: GenerationStatus,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub reveal_tick_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SegmentOut {
    pub kind: SegmentKind,
    pub content: String,
    pub copied: bool,
}

/// Build the client snapshot of a learner session.
pub fn to_session_out(
    s: &LearnerSession,
    lessons: &[Lesson],
    prompts: &Prompts,
    timing: &Timing,
    now: Instant,
) -> SessionOut {
    let desc = descriptor(s.active_module(), prompts);
    let module = match s.instance() {
        ModuleInstance::Welcome => ModuleOut::Welcome { title: WELCOME_TITLE, text: WELCOME_TEXT },
        ModuleInstance::Course(view) => ModuleOut::Course(to_course_out(view, s.progress(), lessons)),
        ModuleInstance::Text { cycle, .. } => ModuleOut::Text {
            title: desc.title,
            description: desc.description,
            generation: to_generation_out(cycle, timing.text_reveal_tick_ms),
        },
        ModuleInstance::Image { cycle, .. } => ModuleOut::Image {
            title: desc.title,
            description: desc.description,
            generation: to_generation_out(cycle, timing.text_reveal_tick_ms),
            image_url: cycle
                .image()
                .map(|_| format!("/api/v1/sessions/{}/image?instance={}", s.id, s.instance_id())),
        },
        ModuleInstance::Story(conversation) => ModuleOut::Story {
            title: desc.title,
            description: desc.description,
            conversation: to_conversation_out(conversation, timing.chat_reveal_tick_ms),
        },
        ModuleInstance::Code { wizard, .. } => ModuleOut::Code {
            title: desc.title,
            description: desc.description,
            tab: wizard.tab,
            lesson: if wizard.tab == CodeTab::Lesson { code_lesson() } else { Vec::new() },
            generation: to_generation_out(&wizard.cycle, timing.text_reveal_tick_ms),
            segments: wizard
                .segments
                .iter()
                .enumerate()
                .map(|(i, seg)| SegmentOut {
                    kind: seg.kind,
                    content: seg.content.clone(),
                    copied: wizard.is_copied(i, now, timing.copy_ack()),
                })
                .collect(),
        },
    };

    let companion = to_conversation_out(s.companion(), timing.chat_reveal_tick_ms);
    SessionOut {
        id: s.id,
        active_module: s.active_module(),
        instance_id: s.instance_id(),
        progress: ProgressOut {
            unlocked_count: s.progress().unlocked_count(),
            total: s.progress().total(),
        },
        companion: CompanionOut {
            open: s.companion_open(),
            pending: companion.pending,
            turns: companion.turns,
            reveal_tick_ms: companion.reveal_tick_ms,
        },
        module,
    }
}

fn to_course_out(view: &CourseView, progress: &CourseProgress, lessons: &[Lesson]) -> CourseOut {
    let quiz = view.gating_quiz(lessons, progress).map(|q| {
        let attempt = view.attempt();
        let correct = attempt
            .submitted
            .then(|| attempt.selected == Some(q.correct_option_index));
        QuizOut {
            question: q.question.clone(),
            options: q.options.clone(),
            selected: attempt.selected,
            submitted: attempt.submitted,
            correct,
            correct_option_index: attempt.submitted.then_some(q.correct_option_index),
            feedback: correct.map(|ok| if ok { QUIZ_CORRECT_FEEDBACK } else { QUIZ_WRONG_FEEDBACK }),
            explanation: (correct == Some(true)).then(|| q.explanation.clone()),
        }
    });
    CourseOut {
        active_lesson: view.active_lesson(),
        lessons: lessons
            .iter()
            .map(|l| LessonSummaryOut { index: l.index, title: l.title.clone(), state: progress.lesson_state(l) })
            .collect(),
        lesson: lessons.get(view.active_lesson()).cloned(),
        quiz,
    }
}

fn to_generation_out(cycle: &GenerationCycle, reveal_tick_ms: u64) -> GenerationOut {
    GenerationOut {
        prompt: cycle.prompt().to_string(),
        status: cycle.status(),
        result: match cycle.result() {
            Some(GenerationOutput::Text(text)) => Some(text.clone()),
            _ => None,
        },
        error_message: cycle.error_message().map(str::to_string),
        reveal_tick_ms,
    }
}

fn to_conversation_out(c: &Conversation, reveal_tick_ms: u64) -> ConversationOut {
    ConversationOut { pending: c.is_pending(), turns: c.view(), reveal_tick_ms }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SelectModuleIn {
    pub module: ModuleKey,
}

#[derive(Debug, Deserialize)]
pub struct IndexIn {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Deserialize)]
pub struct PromptIn {
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct MessageIn {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeTabIn {
    pub tab: CodeTab,
}

#[derive(Debug, Deserialize)]
pub struct CopyIn {
    pub segment: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub instance: Option<u64>,
}

/// Result of any operation that may be a rejected no-op.
#[derive(Debug, Serialize)]
pub struct ActionOut {
    pub accepted: bool,
    pub session: SessionOut,
}

#[derive(Debug, Serialize)]
pub struct CopyOut {
    pub content: Option<String>,
    pub session: SessionOut,
}

#[derive(Serialize)]
pub struct ModulesOut {
    pub modules: Vec<ModuleDescriptor>,
}

#[derive(Serialize)]
pub struct LessonsOut {
    pub lessons: Vec<Lesson>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}
