//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::{header, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::logic;
use crate::modules::all_modules;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

pub async fn http_get_modules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ModulesOut { modules: all_modules(&state.prompts) })
}

pub async fn http_get_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(LessonsOut { lessons: state.lessons.as_ref().clone() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session = logic::create_session(&state).await;
  (StatusCode::CREATED, Json(session))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionOut>, ApiError> {
  Ok(Json(logic::get_session(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.end_session(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// Unknown module keys are a 400, not axum's default 422.
#[instrument(level = "info", skip(state, body))]
pub async fn http_select_module(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  body: Result<Json<SelectModuleIn>, JsonRejection>,
) -> Result<Json<ActionOut>, ApiError> {
  let Json(body) = body?;
  info!(target: "session", %id, module = %body.module, "HTTP select_module");
  Ok(Json(logic::select_module(&state, id, body.module).await?))
}

#[instrument(level = "info", skip(state), fields(index = body.index))]
pub async fn http_select_lesson(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<IndexIn>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::select_lesson(&state, id, body.index).await?))
}

#[instrument(level = "info", skip(state), fields(index = body.index))]
pub async fn http_choose_option(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<IndexIn>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::choose_option(&state, id, body.index).await?))
}

#[instrument(level = "info", skip(state), fields(index = ?body.index))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<ActionOut>, ApiError> {
  let out = logic::submit_answer(&state, id, body.index).await?;
  info!(target: "course", %id, accepted = out.accepted, "HTTP quiz answer handled");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len()))]
pub async fn http_generate(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PromptIn>,
) -> Result<Json<ActionOut>, ApiError> {
  let out = logic::generate(&state, id, &body.prompt).await?;
  info!(target: "generation", %id, accepted = out.accepted, "HTTP generate handled");
  Ok(Json(out))
}

/// Download the current image as a file.
#[instrument(level = "info", skip(state))]
pub async fn http_get_image(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(q): Query<ImageQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let image = logic::current_image(&state, id, q.instance).await?;
  let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
  let disposition = format!("attachment; filename=\"ai-adventure-{}.{}\"", millis, image.extension());
  Ok((
    [(header::CONTENT_TYPE, image.mime.clone()), (header::CONTENT_DISPOSITION, disposition)],
    image.bytes,
  ))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_story_message(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MessageIn>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::story_message(&state, id, &body.text).await?))
}

#[instrument(level = "info", skip(state), fields(tab = ?body.tab))]
pub async fn http_code_tab(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CodeTabIn>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::set_code_tab(&state, id, body.tab).await?))
}

#[instrument(level = "info", skip(state), fields(segment = body.segment))]
pub async fn http_copy_code(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CopyIn>,
) -> Result<Json<CopyOut>, ApiError> {
  Ok(Json(logic::copy_code(&state, id, body.segment).await?))
}

pub async fn http_companion_open(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::set_companion_open(&state, id, true).await?))
}

pub async fn http_companion_close(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::set_companion_open(&state, id, false).await?))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_companion_message(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MessageIn>,
) -> Result<Json<ActionOut>, ApiError> {
  Ok(Json(logic::companion_message(&state, id, &body.text).await?))
}
