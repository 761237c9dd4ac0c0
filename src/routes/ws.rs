//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request;
//! replies to AI-bearing requests may arrive after later, quicker ones.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::error::ApiError;
use crate::logic;
use crate::modules::all_modules;
use crate::protocol::{ActionOut, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "adventure_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "adventure_backend", "WebSocket connected");
  let (tx, mut rx) = mpsc::unbounded_channel::<ServerWsMessage>();
  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => match serde_json::from_str::<ClientWsMessage>(&txt) {
            Ok(incoming) => {
              debug!(target: "adventure_backend", "WS received: {:?}", &incoming);
              dispatch(incoming, &state, &tx).await;
            }
            Err(e) => { let _ = tx.send(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }); }
          },
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
      Some(reply) = rx.recv() => {
        let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "adventure_backend", error = %e, "WS send error");
          break;
        }
      }
    }
  }
  info!(target: "adventure_backend", "WebSocket disconnected");
}

/// Answer one client message through `tx`. Messages that wait on the AI
/// service run as their own task, so the connection keeps serving navigation
/// and the companion meanwhile. Other replies keep their arrival order.
async fn dispatch(msg: ClientWsMessage, state: &Arc<AppState>, tx: &mpsc::UnboundedSender<ServerWsMessage>) {
  if msg.awaits_ai() {
    let (state, tx) = (state.clone(), tx.clone());
    tokio::spawn(async move {
      let _ = tx.send(handle_client_ws(msg, &state).await);
    });
  } else {
    let _ = tx.send(handle_client_ws(msg, state).await);
  }
}

fn session_reply(result: Result<ActionOut, ApiError>) -> ServerWsMessage {
  match result {
    Ok(ActionOut { accepted, session }) => ServerWsMessage::Session { accepted, session },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListModules => ServerWsMessage::Modules { modules: all_modules(&state.prompts) },

    ClientWsMessage::CreateSession => {
      let session = logic::create_session(state).await;
      ServerWsMessage::Session { accepted: true, session }
    }

    ClientWsMessage::GetSession { session_id } => match logic::get_session(state, session_id).await {
      Ok(session) => ServerWsMessage::Session { accepted: true, session },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::SelectModule { session_id, module } => {
      session_reply(logic::select_module(state, session_id, module).await)
    }

    ClientWsMessage::SelectLesson { session_id, index } => {
      session_reply(logic::select_lesson(state, session_id, index).await)
    }

    ClientWsMessage::ChooseOption { session_id, index } => {
      session_reply(logic::choose_option(state, session_id, index).await)
    }

    ClientWsMessage::SubmitAnswer { session_id, index } => {
      let reply = logic::submit_answer(state, session_id, index).await;
      info!(target: "course", id = %session_id, ok = reply.is_ok(), "WS submit_answer handled");
      session_reply(reply)
    }

    ClientWsMessage::Generate { session_id, prompt } => {
      session_reply(logic::generate(state, session_id, &prompt).await)
    }

    ClientWsMessage::StoryMessage { session_id, text } => {
      session_reply(logic::story_message(state, session_id, &text).await)
    }

    ClientWsMessage::CompanionToggle { session_id, open } => {
      session_reply(logic::set_companion_open(state, session_id, open).await)
    }

    ClientWsMessage::CompanionMessage { session_id, text } => {
      session_reply(logic::companion_message(state, session_id, &text).await)
    }

    ClientWsMessage::CodeTab { session_id, tab } => {
      session_reply(logic::set_code_tab(state, session_id, tab).await)
    }

    ClientWsMessage::CopyCode { session_id, segment } => match logic::copy_code(state, session_id, segment).await {
      Ok(out) => ServerWsMessage::Copied { content: out.content, session: out.session },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
  }
}
