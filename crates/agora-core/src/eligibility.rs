//! Publication and voting eligibility — pure functions of a question's
//! timestamps and the current instant.
//!
//! Both ends of the voting window are exclusive: at the exact instant of
//! publication, and at the exact instant of closing, voting is not allowed.
//! Questions without an end date accept votes at any time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::question::Question;

/// Phase of a question's voting window at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingWindow {
  NotYetOpen,
  Open,
  Closed,
}

/// `true` iff `pub_date <= now`.
pub fn is_published(question: &Question, now: DateTime<Utc>) -> bool {
  question.pub_date <= now
}

/// `true` iff `now - 1 day <= pub_date <= now`.
pub fn was_published_recently(question: &Question, now: DateTime<Utc>) -> bool {
  now - Duration::days(1) <= question.pub_date && question.pub_date <= now
}

/// `true` iff the question has no end date, or `pub_date < now < end_date`.
pub fn can_vote(question: &Question, now: DateTime<Utc>) -> bool {
  match question.end_date {
    None => true,
    Some(end) => question.pub_date < now && now < end,
  }
}

pub fn voting_window(question: &Question, now: DateTime<Utc>) -> VotingWindow {
  if can_vote(question, now) {
    return VotingWindow::Open;
  }
  match question.end_date {
    Some(end) if now >= end => VotingWindow::Closed,
    _ => VotingWindow::NotYetOpen,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-15T09:30:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  fn question(pub_days: i64, end_days: Option<i64>) -> Question {
    let now = now();
    Question {
      question_id: Uuid::new_v4(),
      text:        "What's up?".into(),
      pub_date:    now + Duration::days(pub_days),
      end_date:    end_days.map(|d| now + Duration::days(d)),
      choices:     Vec::new(),
    }
  }

  // ── is_published ────────────────────────────────────────────────────────

  #[test]
  fn future_question_is_not_published() {
    assert!(!is_published(&question(5, None), now()));
  }

  #[test]
  fn present_question_is_published() {
    assert!(is_published(&question(0, None), now()));
  }

  #[test]
  fn past_question_is_published() {
    assert!(is_published(&question(-30, None), now()));
  }

  // ── was_published_recently ──────────────────────────────────────────────

  #[test]
  fn recently_false_for_future_question() {
    assert!(!was_published_recently(&question(30, None), now()));
  }

  #[test]
  fn recently_false_for_question_older_than_a_day() {
    let mut q = question(-1, None);
    q.pub_date -= Duration::seconds(1);
    assert!(!was_published_recently(&q, now()));
  }

  #[test]
  fn recently_true_at_both_edges() {
    assert!(was_published_recently(&question(0, None), now()));
    assert!(was_published_recently(&question(-1, None), now()));
  }

  #[test]
  fn recently_false_one_second_in_the_future() {
    let mut q = question(0, None);
    q.pub_date += Duration::seconds(1);
    assert!(!was_published_recently(&q, now()));
  }

  // ── can_vote ────────────────────────────────────────────────────────────

  #[test]
  fn can_vote_inside_window() {
    let q = question(-1, Some(1));
    assert!(can_vote(&q, now()));
  }

  #[test]
  fn can_vote_without_end_date_even_before_publication() {
    assert!(can_vote(&question(7, None), now()));
    assert!(can_vote(&question(-30, None), now()));
  }

  #[test]
  fn cannot_vote_after_end_date() {
    assert!(!can_vote(&question(0, Some(-5)), now()));
  }

  #[test]
  fn window_bounds_are_exclusive() {
    let q = question(0, Some(1));
    assert!(!can_vote(&q, q.pub_date));
    assert!(!can_vote(&q, q.end_date.unwrap()));
    assert!(can_vote(&q, q.pub_date + Duration::nanoseconds(1)));
  }

  // ── voting_window ───────────────────────────────────────────────────────

  #[test]
  fn window_phases() {
    let q = question(-1, Some(1));
    assert_eq!(voting_window(&q, now()), VotingWindow::Open);
    assert_eq!(voting_window(&q, now() - Duration::days(2)), VotingWindow::NotYetOpen);
    assert_eq!(voting_window(&q, q.pub_date), VotingWindow::NotYetOpen);
    assert_eq!(voting_window(&q, q.end_date.unwrap()), VotingWindow::Closed);
    assert_eq!(voting_window(&q, now() + Duration::days(3)), VotingWindow::Closed);
  }

  #[test]
  fn inverted_window_reads_as_closed() {
    let q = question(0, Some(-5));
    assert_eq!(voting_window(&q, now()), VotingWindow::Closed);
  }

  #[test]
  fn open_ended_question_is_always_open() {
    let q = question(3, None);
    assert_eq!(voting_window(&q, now()), VotingWindow::Open);
  }
}
