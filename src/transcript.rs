//! Turn-based conversation transcript shared by every chat-style module.
//!
//! A `Conversation` owns its chat session with the AI service. Sending a turn
//! is split in two so the owner never holds a lock across the network call:
//! `submit_user_turn` appends the user turn and hands out the session in an
//! `Outbound`, and `complete` appends the reply and takes the session back.
//! While the session is out the conversation is `pending` and rejects new turns.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::{AiService, ChatSession};
use crate::domain::{ConversationTurn, Speaker};
use crate::error::AiError;

pub struct Conversation {
  turns: Vec<ConversationTurn>,
  session: Option<Box<dyn ChatSession>>,
  in_flight: Option<u64>,
  next_ticket: u64,
}

/// Proof that a turn is in flight. Only the matching ticket can complete it.
#[derive(Debug, PartialEq, Eq)]
pub struct TurnTicket(u64);

/// A user turn on its way to the AI service.
pub struct Outbound {
  pub ticket: TurnTicket,
  pub text: String,
  session: Box<dyn ChatSession>,
}

/// The service's answer to an `Outbound`, ready to be applied.
pub struct Completion {
  ticket: TurnTicket,
  session: Box<dyn ChatSession>,
  reply: Result<String, AiError>,
}

impl Completion {
  pub fn is_ok(&self) -> bool {
    self.reply.is_ok()
  }
}

impl Outbound {
  /// Await the AI continuation. The session carries all earlier turns.
  pub async fn send(mut self) -> Completion {
    let reply = self.session.send(&self.text).await;
    Completion { ticket: self.ticket, session: self.session, reply }
  }
}

/// A turn as presented to clients.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TurnView {
  pub speaker: Speaker,
  pub text: String,
  /// Present this turn with a progressive reveal.
  pub reveal: bool,
}

impl Conversation {
  /// Open a session bound to `persona` and seed the transcript with an optional greeting.
  pub fn start(ai: &dyn AiService, persona: &str, greeting: Option<&str>) -> Self {
    let turns = greeting
      .filter(|g| !g.is_empty())
      .map(|g| vec![ConversationTurn::ai(g)])
      .unwrap_or_default();
    Self {
      turns,
      session: Some(ai.open_conversation(Some(persona))),
      in_flight: None,
      next_ticket: 0,
    }
  }

  pub fn turns(&self) -> &[ConversationTurn] {
    &self.turns
  }

  pub fn is_pending(&self) -> bool {
    self.in_flight.is_some()
  }

  /// Append a user turn and release the session for sending.
  /// Returns `None` (and changes nothing) for blank text or while a reply is pending.
  pub fn submit_user_turn(&mut self, text: &str) -> Option<Outbound> {
    if text.trim().is_empty() || self.is_pending() {
      return None;
    }
    let Some(session) = self.session.take() else {
      warn!(target: "conversation", "Conversation has no chat session; rejecting turn");
      return None;
    };
    let id = self.next_ticket;
    self.next_ticket += 1;
    self.in_flight = Some(id);
    self.turns.push(ConversationTurn::user(text));
    Some(Outbound { ticket: TurnTicket(id), text: text.to_string(), session })
  }

  /// Append the AI turn for an in-flight request. Failures become `apology`.
  /// Returns false when the ticket does not match the request in flight.
  pub fn complete(&mut self, completion: Completion, apology: &str) -> bool {
    if self.in_flight != Some(completion.ticket.0) {
      debug!(target: "conversation", ticket = completion.ticket.0, "Ignoring completion for a turn that is not in flight");
      return false;
    }
    let text = match completion.reply {
      Ok(text) => text,
      Err(e) => {
        warn!(target: "conversation", error = %e, "Chat turn failed; answering with apology");
        apology.to_string()
      }
    };
    self.turns.push(ConversationTurn::ai(text));
    self.session = Some(completion.session);
    self.in_flight = None;
    true
  }

  /// Turns with the reveal hint: only a trailing AI turn with nothing pending animates.
  pub fn view(&self) -> Vec<TurnView> {
    let last = self.turns.len().checked_sub(1);
    self
      .turns
      .iter()
      .enumerate()
      .map(|(i, t)| TurnView {
        speaker: t.speaker,
        text: t.text.clone(),
        reveal: Some(i) == last && t.speaker == Speaker::Ai && !self.is_pending(),
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::fake::FakeAi;

  const SORRY: &str = "sorry!";

  fn counts(c: &Conversation) -> (usize, usize) {
    let user = c.turns().iter().filter(|t| t.speaker == Speaker::User).count();
    (user, c.turns().len() - user)
  }

  #[test]
  fn start_seeds_greeting_and_binds_persona() {
    let ai = FakeAi::new();
    let c = Conversation::start(&ai, "storyteller", Some("Once upon a time?"));
    assert_eq!(c.turns(), &[ConversationTurn::ai("Once upon a time?")]);
    assert!(!c.is_pending());

    let quiet = Conversation::start(&ai, "storyteller", None);
    assert!(quiet.turns().is_empty());
  }

  #[test]
  fn blank_text_is_rejected_without_changes() {
    let ai = FakeAi::new();
    let mut c = Conversation::start(&ai, "p", Some("hi"));
    let before = c.turns().to_vec();
    assert!(c.submit_user_turn("").is_none());
    assert!(c.submit_user_turn("   ").is_none());
    assert_eq!(c.turns(), before.as_slice());
    assert!(!c.is_pending());
  }

  #[tokio::test]
  async fn turn_round_trip_appends_reply_and_clears_pending() {
    let ai = FakeAi::new().reply("A dragon appears!");
    let mut c = Conversation::start(&ai, "storyteller", Some("hi"));

    let out = c.submit_user_turn("a knight").expect("accepted");
    assert!(c.is_pending());
    assert!(c.submit_user_turn("another").is_none(), "second turn while pending");
    assert_eq!(c.turns().len(), 2);

    let done = out.send().await;
    assert!(c.complete(done, SORRY));
    assert!(!c.is_pending());
    assert_eq!(c.turns().last(), Some(&ConversationTurn::ai("A dragon appears!")));
    assert_eq!(ai.chat_log(), vec![(Some("storyteller".to_string()), vec!["a knight".to_string()])]);
  }

  #[tokio::test]
  async fn session_carries_prior_turns() {
    let ai = FakeAi::new().reply("one").reply("two");
    let mut c = Conversation::start(&ai, "p", None);
    let done = c.submit_user_turn("first").unwrap().send().await;
    c.complete(done, SORRY);
    let done = c.submit_user_turn("second").unwrap().send().await;
    c.complete(done, SORRY);

    let log = ai.chat_log();
    assert_eq!(log[1].1, vec!["first", "one", "second"]);
  }

  #[tokio::test]
  async fn failure_appends_apology_and_unblocks() {
    let ai = FakeAi::new().fail().reply("ok now");
    let mut c = Conversation::start(&ai, "p", None);
    let done = c.submit_user_turn("hello").unwrap().send().await;
    assert!(!done.is_ok());
    c.complete(done, SORRY);
    assert_eq!(c.turns().last(), Some(&ConversationTurn::ai(SORRY)));
    assert!(!c.is_pending());

    let done = c.submit_user_turn("again").unwrap().send().await;
    c.complete(done, SORRY);
    assert_eq!(c.turns().last().map(|t| t.text.as_str()), Some("ok now"));
  }

  #[tokio::test]
  async fn ai_turns_never_outrun_user_turns_by_more_than_one() {
    let ai = FakeAi::new().reply("a").fail().reply("c");
    let mut c = Conversation::start(&ai, "p", Some("greeting"));
    for text in ["x", "", "y", "z"] {
      if let Some(out) = c.submit_user_turn(text) {
        let (user, ai_turns) = counts(&c);
        assert!(c.is_pending());
        assert!(ai_turns <= user + 1);
        let done = out.send().await;
        c.complete(done, SORRY);
      }
      let (user, ai_turns) = counts(&c);
      assert!(ai_turns <= user + 1);
      assert!(!c.is_pending());
    }
    assert_eq!(counts(&c), (3, 4));
  }

  #[tokio::test]
  async fn reveal_only_marks_trailing_ai_turn_when_idle() {
    let ai = FakeAi::new().reply("story part");
    let mut c = Conversation::start(&ai, "p", Some("hi"));
    assert_eq!(c.view().iter().map(|t| t.reveal).collect::<Vec<_>>(), [true]);

    let out = c.submit_user_turn("go").unwrap();
    assert!(c.view().iter().all(|t| !t.reveal));

    let done = out.send().await;
    c.complete(done, SORRY);
    assert_eq!(c.view().iter().map(|t| t.reveal).collect::<Vec<_>>(), [false, false, true]);
  }
}
