//! Turning raw AI text into display pieces: fenced-code segmentation and the
//! copy acknowledgment of code blocks.

use std::time::{Duration, Instant};

use serde::Serialize;

const FENCE: &str = "```";

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
  Prose,
  Code,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Segment {
  pub kind: SegmentKind,
  pub content: String,
}

impl Segment {
  fn prose(content: &str) -> Self {
    Self { kind: SegmentKind::Prose, content: content.to_string() }
  }
}

/// Split text on triple-backtick fences. Prose is kept verbatim; code has its
/// language tag line removed and is trimmed. Empty pieces are dropped and an
/// unterminated fence stays prose.
pub fn segment(text: &str) -> Vec<Segment> {
  let mut out = Vec::new();
  let mut rest = text;
  while let Some(open) = rest.find(FENCE) {
    let after_open = &rest[open + FENCE.len()..];
    let Some(close) = after_open.find(FENCE) else { break };
    push_prose(&mut out, &rest[..open]);
    let code = strip_language_tag(&after_open[..close]).trim();
    if !code.is_empty() {
      out.push(Segment { kind: SegmentKind::Code, content: code.to_string() });
    }
    rest = &after_open[close + FENCE.len()..];
  }
  push_prose(&mut out, rest);
  out
}

fn push_prose(out: &mut Vec<Segment>, text: &str) {
  if !text.is_empty() {
    out.push(Segment::prose(text));
  }
}

/// Drop a word-only first line (```python\n...). Anything else is code.
fn strip_language_tag(body: &str) -> &str {
  let tag_len = body
    .char_indices()
    .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
    .map(|(i, _)| i)
    .unwrap_or(body.len());
  match body[tag_len..].strip_prefix('\n').or_else(|| body[tag_len..].strip_prefix("\r\n")) {
    Some(code) => code,
    None => body,
  }
}

/// Transient "copied!" flag of one code block. Clears itself after `ttl`.
#[derive(Clone, Debug, Default)]
pub struct CopyAck {
  copied_at: Option<Instant>,
}

impl CopyAck {
  pub fn mark(&mut self, now: Instant) {
    self.copied_at = Some(now);
  }

  pub fn is_active(&self, now: Instant, ttl: Duration) -> bool {
    self.copied_at.is_some_and(|at| now.saturating_duration_since(at) < ttl)
  }
}
