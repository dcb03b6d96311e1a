//! [`Polls`] — the operations exposed to the HTTP layer, one explicit method
//! per request kind.
//!
//! The service owns the injected [`Clock`]; every eligibility decision it
//! makes uses a single `now` read per call.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  clock::Clock,
  eligibility::{self, VotingWindow},
  ledger::{self, RetryPolicy, VoteOutcome},
  question::Question,
  results::{self, Tally},
  store::PollStore,
  vote::{UserId, Vote},
};

/// Default number of questions returned by the listing.
pub const DEFAULT_PAGE_SIZE: usize = 5;

pub struct Polls<S> {
  store:     Arc<S>,
  clock:     Arc<dyn Clock>,
  page_size: usize,
  retry:     RetryPolicy,
}

impl<S> Clone for Polls<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      clock:     Arc::clone(&self.clock),
      page_size: self.page_size,
      retry:     self.retry,
    }
  }
}

impl<S: PollStore> Polls<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      clock,
      page_size: DEFAULT_PAGE_SIZE,
      retry: RetryPolicy::default(),
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// The most recently published questions, newest first, capped at the
  /// configured page size.
  pub async fn list_published_questions(&self) -> Result<Vec<Question>, S::Error> {
    self.store.list_published(self.clock.now(), self.page_size).await
  }

  /// A publicly visible question. Unpublished questions read as `None`,
  /// exactly like missing ones.
  pub async fn get_question(&self, id: Uuid) -> Result<Option<Question>, S::Error> {
    let now = self.clock.now();
    Ok(
      self
        .store
        .get_question(id)
        .await?
        .filter(|q| eligibility::is_published(q, now)),
    )
  }

  /// Resolve the question and cast `user`'s ballot on it.
  pub async fn cast_vote(
    &self,
    user: &UserId,
    question_id: Uuid,
    choice_id: Option<Uuid>,
  ) -> Result<VoteOutcome, S::Error> {
    let now = self.clock.now();
    let question = match self.store.get_question(question_id).await? {
      Some(q) if eligibility::is_published(&q, now) => q,
      _ => return Ok(VoteOutcome::QuestionNotFound),
    };
    ledger::cast_vote(self.store.as_ref(), &question, user, choice_id, now, self.retry).await
  }

  pub async fn results_for(&self, question: &Question) -> Result<Tally, S::Error> {
    let counts = self.store.vote_counts(question.question_id).await?;
    Ok(results::tally(question, &counts))
  }

  pub async fn vote_count(&self, choice_id: Uuid) -> Result<u64, S::Error> {
    self.store.vote_count(choice_id).await
  }

  pub fn voting_status(&self, question: &Question) -> VotingWindow {
    eligibility::voting_window(question, self.clock.now())
  }

  pub fn was_published_recently(&self, question: &Question) -> bool {
    eligibility::was_published_recently(question, self.clock.now())
  }

  /// The caller's current vote on a question, if they have cast one.
  pub async fn my_vote(
    &self,
    user: &UserId,
    question_id: Uuid,
  ) -> Result<Option<Vote>, S::Error> {
    self.store.get_vote(user, question_id).await
  }
}
