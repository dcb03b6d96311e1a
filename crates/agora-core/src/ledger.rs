//! The vote ledger: turns a ballot for an already-resolved question into at
//! most one stored vote per `(user, question)`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  eligibility::can_vote,
  question::Question,
  store::{PollStore, StoreError as _},
  vote::{BallotChange, RecordedVote, UserId, Vote, VoteWrite},
};

/// The tagged result of a ballot. Rejections are ordinary values, not errors;
/// only persistence failures surface as `Err`.
#[derive(Debug, Clone)]
pub enum VoteOutcome {
  Recorded {
    vote:   Vote,
    change: BallotChange,
  },
  /// No choice was given, or it does not belong to the question.
  InvalidChoice,
  /// The question is outside its voting window.
  VotingClosed,
  QuestionNotFound,
}

impl VoteOutcome {
  pub fn is_recorded(&self) -> bool { matches!(self, Self::Recorded { .. }) }
}

/// How many times a transiently failing upsert is attempted in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub attempts: u32,
}

impl RetryPolicy {
  pub fn new(attempts: u32) -> Self { Self { attempts: attempts.max(1) } }
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { attempts: 3 } }
}

/// Cast `user`'s ballot for `choice_id` on `question` at instant `now`.
///
/// Eligibility is checked before choice membership, so a closed question
/// reports [`VoteOutcome::VotingClosed`] even for a bogus choice.
pub async fn cast_vote<S>(
  store: &S,
  question: &Question,
  user: &UserId,
  choice_id: Option<Uuid>,
  now: DateTime<Utc>,
  retry: RetryPolicy,
) -> Result<VoteOutcome, S::Error>
where
  S: PollStore,
{
  if !can_vote(question, now) {
    return Ok(VoteOutcome::VotingClosed);
  }

  let Some(choice_id) = choice_id.filter(|id| question.has_choice(*id)) else {
    return Ok(VoteOutcome::InvalidChoice);
  };

  let write = VoteWrite {
    user_id: user.clone(),
    question_id: question.question_id,
    choice_id,
    cast_at: now,
  };

  let mut attempt = 1;
  loop {
    match store.record_vote(write.clone()).await {
      Ok(RecordedVote::Written { vote, change }) => {
        return Ok(VoteOutcome::Recorded { vote, change });
      }
      // The choice was removed between resolving the question and writing.
      Ok(RecordedVote::ChoiceMismatch) => return Ok(VoteOutcome::InvalidChoice),
      Err(e) if e.is_transient() && attempt < retry.attempts => {
        tracing::warn!(
          question = %question.question_id,
          attempt,
          error = %e,
          "transient failure recording vote, retrying"
        );
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use chrono::Duration;

  use super::*;
  use crate::question::{Choice, NewQuestion};

  #[derive(Debug, thiserror::Error)]
  #[error("database is busy")]
  struct Busy;

  impl crate::store::StoreError for Busy {
    fn is_transient(&self) -> bool { true }
  }

  /// Fails `record_vote` with a transient error a fixed number of times.
  struct FlakyStore {
    failures_left: AtomicU32,
    calls:         AtomicU32,
  }

  impl FlakyStore {
    fn failing(times: u32) -> Self {
      Self { failures_left: AtomicU32::new(times), calls: AtomicU32::new(0) }
    }
  }

  impl PollStore for FlakyStore {
    type Error = Busy;
    async fn create_question(&self, _: NewQuestion) -> Result<Question, Busy> { unimplemented!() }
    async fn add_choice(&self, _: Uuid, _: String) -> Result<Choice, Busy> { unimplemented!() }
    async fn get_question(&self, _: Uuid) -> Result<Option<Question>, Busy> { unimplemented!() }
    async fn list_published(&self, _: DateTime<Utc>, _: usize) -> Result<Vec<Question>, Busy> { unimplemented!() }
    async fn delete_question(&self, _: Uuid) -> Result<bool, Busy> { unimplemented!() }
    async fn delete_choice(&self, _: Uuid) -> Result<bool, Busy> { unimplemented!() }
    async fn get_vote(&self, _: &UserId, _: Uuid) -> Result<Option<Vote>, Busy> { unimplemented!() }
    async fn vote_count(&self, _: Uuid) -> Result<u64, Busy> { unimplemented!() }
    async fn vote_counts(&self, _: Uuid) -> Result<Vec<(Uuid, u64)>, Busy> { unimplemented!() }

    async fn record_vote(&self, write: VoteWrite) -> Result<RecordedVote, Busy> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let left = self.failures_left.load(Ordering::SeqCst);
      if left > 0 {
        self.failures_left.store(left - 1, Ordering::SeqCst);
        return Err(Busy);
      }
      Ok(RecordedVote::Written {
        vote:   Vote {
          vote_id:     Uuid::new_v4(),
          user_id:     write.user_id,
          question_id: write.question_id,
          choice_id:   write.choice_id,
          cast_at:     write.cast_at,
        },
        change: BallotChange::Created,
      })
    }
  }

  fn open_question(now: DateTime<Utc>) -> Question {
    let question_id = Uuid::new_v4();
    Question {
      question_id,
      text: "Tabs or spaces?".into(),
      pub_date: now - Duration::days(1),
      end_date: Some(now + Duration::days(1)),
      choices: vec![Choice {
        choice_id: Uuid::new_v4(),
        question_id,
        text: "spaces".into(),
        position: 0,
      }],
    }
  }

  fn alice() -> UserId { UserId::new("alice").unwrap() }

  #[tokio::test]
  async fn closed_question_rejects_before_touching_store() {
    let now   = Utc::now();
    let store = FlakyStore::failing(0);
    let mut q = open_question(now);
    q.end_date = Some(now - Duration::days(5));

    let choice = q.choices[0].choice_id;
    let outcome = cast_vote(&store, &q, &alice(), Some(choice), now, RetryPolicy::default())
      .await
      .unwrap();
    assert!(matches!(outcome, VoteOutcome::VotingClosed));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn missing_or_foreign_choice_is_invalid() {
    let now   = Utc::now();
    let store = FlakyStore::failing(0);
    let q     = open_question(now);

    let none = cast_vote(&store, &q, &alice(), None, now, RetryPolicy::default())
      .await
      .unwrap();
    assert!(matches!(none, VoteOutcome::InvalidChoice));

    let foreign = cast_vote(&store, &q, &alice(), Some(Uuid::new_v4()), now, RetryPolicy::default())
      .await
      .unwrap();
    assert!(matches!(foreign, VoteOutcome::InvalidChoice));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn transient_failures_are_retried() {
    let now    = Utc::now();
    let store  = FlakyStore::failing(2);
    let q      = open_question(now);
    let choice = q.choices[0].choice_id;

    let outcome = cast_vote(&store, &q, &alice(), Some(choice), now, RetryPolicy::new(3))
      .await
      .unwrap();
    assert!(outcome.is_recorded());
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn persistent_transient_failure_is_reported() {
    let now    = Utc::now();
    let store  = FlakyStore::failing(10);
    let q      = open_question(now);
    let choice = q.choices[0].choice_id;

    let result = cast_vote(&store, &q, &alice(), Some(choice), now, RetryPolicy::new(2)).await;
    assert!(result.is_err());
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
  }
}
