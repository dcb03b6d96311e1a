//! The `PollStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `agora-store-sqlite`).
//! Higher layers (`agora-api`, `agora-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  question::{Choice, NewQuestion, Question},
  vote::{RecordedVote, UserId, Vote, VoteWrite},
};

/// Errors raised by a [`PollStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` for failures that may succeed if the operation is simply
  /// repeated, such as a busy or locked database.
  fn is_transient(&self) -> bool { false }
}

/// Abstraction over an Agora persistence backend.
///
/// Implementations must enforce at most one vote per `(user, question)` at
/// the storage layer; [`PollStore::record_vote`] is a single conditional
/// upsert, never a separate read followed by a write.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PollStore: Send + Sync {
  type Error: StoreError;

  // ── Questions and choices ─────────────────────────────────────────────

  /// Validate and persist a new question together with its initial choices.
  fn create_question(
    &self,
    input: NewQuestion,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  /// Append a choice to an existing question.
  fn add_choice(
    &self,
    question_id: Uuid,
    text: String,
  ) -> impl Future<Output = Result<Choice, Self::Error>> + Send + '_;

  /// Retrieve a question and its choices, whether or not it is published.
  fn get_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  /// Questions with `pub_date <= now`, most recently published first, at most
  /// `limit` of them.
  fn list_published(
    &self,
    now: DateTime<Utc>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  /// Delete a question, cascading to its choices and votes. Returns `false`
  /// if it did not exist.
  fn delete_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a choice, cascading to its votes. Returns `false` if it did not
  /// exist.
  fn delete_choice(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Insert the user's vote for the question, or move their existing vote to
  /// `write.choice_id`. Yields [`RecordedVote::ChoiceMismatch`] without
  /// writing if the choice does not belong to the question.
  fn record_vote(
    &self,
    write: VoteWrite,
  ) -> impl Future<Output = Result<RecordedVote, Self::Error>> + Send + '_;

  /// The user's current vote on a question, if any.
  fn get_vote<'a>(
    &'a self,
    user: &'a UserId,
    question_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + 'a;

  // ── Aggregation ───────────────────────────────────────────────────────

  /// Number of votes currently referencing `choice_id`.
  fn vote_count(
    &self,
    choice_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// `(choice_id, count)` for every choice of the question, zero-vote choices
  /// included.
  fn vote_counts(
    &self,
    question_id: Uuid,
  ) -> impl Future<Output = Result<Vec<(Uuid, u64)>, Self::Error>> + Send + '_;
}
