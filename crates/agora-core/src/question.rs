//! Questions and their choices — the poll entities.
//!
//! A question owns an ordered list of choices. Choices never carry a vote
//! count; counts are derived from the vote ledger on read (see
//! [`crate::results`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum length, in characters, of question and choice text.
pub const MAX_TEXT_LEN: usize = 200;

// ─── Question ────────────────────────────────────────────────────────────────

/// A poll with a publication window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id: Uuid,
  pub text:        String,
  /// The question becomes visible once `pub_date <= now`.
  pub pub_date:    DateTime<Utc>,
  /// `None` means voting never closes.
  pub end_date:    Option<DateTime<Utc>>,
  /// Ordered by display position.
  pub choices:     Vec<Choice>,
}

impl Question {
  /// Look up one of this question's choices by id.
  pub fn choice(&self, choice_id: Uuid) -> Option<&Choice> {
    self.choices.iter().find(|c| c.choice_id == choice_id)
  }

  pub fn has_choice(&self, choice_id: Uuid) -> bool {
    self.choice(choice_id).is_some()
  }
}

// ─── Choice ──────────────────────────────────────────────────────────────────

/// A selectable option belonging to exactly one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
  pub choice_id:   Uuid,
  pub question_id: Uuid,
  pub text:        String,
  /// Zero-based display position within the question.
  pub position:    u32,
}

// ─── NewQuestion ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::PollStore::create_question`].
#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub text:     String,
  pub pub_date: DateTime<Utc>,
  pub end_date: Option<DateTime<Utc>>,
  /// Choice texts, in display order.
  pub choices:  Vec<String>,
}

impl NewQuestion {
  /// A question published at `pub_date` that never closes and has no choices.
  pub fn new(text: impl Into<String>, pub_date: DateTime<Utc>) -> Self {
    Self {
      text: text.into(),
      pub_date,
      end_date: None,
      choices: Vec::new(),
    }
  }

  pub fn closing_at(mut self, end_date: DateTime<Utc>) -> Self {
    self.end_date = Some(end_date);
    self
  }

  pub fn with_choice(mut self, text: impl Into<String>) -> Self {
    self.choices.push(text.into());
    self
  }

  /// Check question and choice text. The window itself is not validated: a
  /// question whose `end_date` precedes its `pub_date` is legal and is simply
  /// never votable.
  pub fn validate(&self) -> Result<()> {
    validate_text("question text", &self.text)?;
    for choice in &self.choices {
      validate_text("choice text", choice)?;
    }
    Ok(())
  }

  /// `true` if the voting window closes before it opens.
  pub fn has_inverted_window(&self) -> bool {
    self.end_date.is_some_and(|end| end < self.pub_date)
  }
}

/// Reject blank text and text longer than [`MAX_TEXT_LEN`] characters.
pub fn validate_text(field: &'static str, text: &str) -> Result<()> {
  if text.trim().is_empty() {
    return Err(Error::InvalidText { field, reason: "must not be blank".into() });
  }
  let len = text.chars().count();
  if len > MAX_TEXT_LEN {
    return Err(Error::InvalidText {
      field,
      reason: format!("{len} characters exceeds the limit of {MAX_TEXT_LEN}"),
    });
  }
  Ok(())
}
