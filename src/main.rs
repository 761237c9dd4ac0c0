//! AI Adventure · learning playground backend for kids
//!
//! - Axum HTTP + WebSocket API over per-learner sessions
//! - OpenAI text, chat and image generation (required)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   OPENAI_API_KEY     : required, startup fails without it
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_TEXT_MODEL  : default "gpt-4o-mini"
//!   OPENAI_IMAGE_MODEL : default "dall-e-3"
//!   AGENT_CONFIG_PATH  : path to TOML config (prompts, timings, optional lessons)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod error;
mod ai;
mod openai;
mod seeds;
mod course;
mod transcript;
mod generation;
mod render;
mod modules;
mod session;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // No degraded mode: a missing credential stops the server here.
  let state = match AppState::from_env() {
    Ok(state) => Arc::new(state),
    Err(e) => {
      error!(target: "adventure_backend", error = %e, "Startup failed");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "adventure_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
