//! Votes and the voter identity they are keyed on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// An opaque reference to an authenticated user, supplied by the external
/// identity provider. The core only ever uses it as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  /// Returns `None` for an empty or all-whitespace identifier.
  pub fn new(id: impl Into<String>) -> Option<Self> {
    let id = id.into();
    if id.trim().is_empty() { None } else { Some(Self(id)) }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// One user's ballot for one question. At most one exists per
/// `(user_id, question_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:     Uuid,
  pub user_id:     UserId,
  pub question_id: Uuid,
  pub choice_id:   Uuid,
  /// When the ballot was last cast; refreshed on every re-vote.
  pub cast_at:     DateTime<Utc>,
}

/// Input to [`crate::store::PollStore::record_vote`].
#[derive(Debug, Clone)]
pub struct VoteWrite {
  pub user_id:     UserId,
  pub question_id: Uuid,
  pub choice_id:   Uuid,
  pub cast_at:     DateTime<Utc>,
}

/// How a recorded ballot relates to the voter's previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BallotChange {
  /// First ballot by this user for this question.
  Created,
  /// The vote moved from another choice.
  Changed { from: Uuid },
  /// The user re-cast the choice they already held.
  Unchanged,
}

impl BallotChange {
  pub fn between(previous: Option<Uuid>, current: Uuid) -> Self {
    match previous {
      None => Self::Created,
      Some(prev) if prev == current => Self::Unchanged,
      Some(prev) => Self::Changed { from: prev },
    }
  }
}

/// Result of a single upsert against the vote ledger.
#[derive(Debug, Clone)]
pub enum RecordedVote {
  Written {
    vote:   Vote,
    change: BallotChange,
  },
  /// The choice was not (or no longer) part of the question when the write
  /// ran. Nothing was written.
  ChoiceMismatch,
}
