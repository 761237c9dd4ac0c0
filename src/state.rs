//! Application state: learner session store, AI service, prompts, timings,
//! and the lesson set.
//!
//! Sessions are kept in memory only and are lost on restart. Each session has
//! its own mutex; the store lock is only held to look a session up.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::ai::AiService;
use crate::config::{load_app_config_from_env, AppConfig, Prompts, Timing};
use crate::domain::Lesson;
use crate::error::{ApiError, ConfigError};
use crate::openai::OpenAI;
use crate::seeds::builtin_lessons;
use crate::session::LearnerSession;

pub type SharedSession = Arc<Mutex<LearnerSession>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    pub ai: Arc<dyn AiService>,
    pub prompts: Prompts,
    pub timing: Timing,
    pub lessons: Arc<Vec<Lesson>>,
}

impl AppState {
    /// Build state from env: load config, pick the lesson set, init OpenAI.
    /// Fails when the AI credential is missing.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = load_app_config_from_env().unwrap_or_default();
        let openai = OpenAI::from_env(&cfg.prompts.default_system)?;
        info!(target: "adventure_backend", base_url = %openai.base_url, text_model = %openai.text_model, image_model = %openai.image_model, "OpenAI enabled.");
        Ok(Self::new(Arc::new(openai), cfg))
    }

    pub fn new(ai: Arc<dyn AiService>, cfg: AppConfig) -> Self {
        let lessons = if cfg.lessons.is_empty() {
            builtin_lessons()
        } else {
            cfg.lessons
        };
        let quizzes = lessons.iter().filter(|l| l.quiz.is_some()).count();
        info!(target: "course", lessons = lessons.len(), quizzes, "Course ready");

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ai,
            prompts: cfg.prompts,
            timing: cfg.timing,
            lessons: Arc::new(lessons),
        }
    }

    /// Create and register a fresh learner session.
    #[instrument(level = "info", skip(self))]
    pub async fn create_session(&self) -> SharedSession {
        let id = Uuid::new_v4();
        let session = LearnerSession::new(id, self.ai.as_ref(), &self.prompts, self.lessons.len());
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, shared.clone());
        info!(target: "session", %id, "Learner session created");
        shared
    }

    pub async fn get_session(&self, id: Uuid) -> Result<SharedSession, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::UnknownSession(id))
    }

    /// Forget a session. Replies still in flight for it are applied to the
    /// detached object and then dropped with it.
    #[instrument(level = "info", skip(self))]
    pub async fn end_session(&self, id: Uuid) -> Result<(), ApiError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!(target: "session", %id, "Learner session ended"))
            .ok_or(ApiError::UnknownSession(id))
    }
}
