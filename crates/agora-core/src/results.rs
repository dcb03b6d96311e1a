//! Result aggregation. Counts are always derived from the vote ledger at
//! query time; nothing here is cached or stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::question::Question;

/// One choice's share of the vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCount {
  pub choice_id: Uuid,
  pub text:      String,
  pub votes:     u64,
}

/// Per-choice vote counts for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub question_id: Uuid,
  pub question:    String,
  /// In the question's display order, zero-vote choices included.
  pub choices:     Vec<ChoiceCount>,
  pub total:       u64,
}

impl Tally {
  pub fn votes_for(&self, choice_id: Uuid) -> Option<u64> {
    self
      .choices
      .iter()
      .find(|c| c.choice_id == choice_id)
      .map(|c| c.votes)
  }
}

/// Join raw `(choice_id, count)` rows onto the question's choices. Rows for
/// choices the question does not own are ignored; choices without a row count
/// as zero.
pub fn tally(question: &Question, counts: &[(Uuid, u64)]) -> Tally {
  let by_choice: HashMap<Uuid, u64> = counts.iter().copied().collect();

  let choices: Vec<ChoiceCount> = question
    .choices
    .iter()
    .map(|c| ChoiceCount {
      choice_id: c.choice_id,
      text:      c.text.clone(),
      votes:     by_choice.get(&c.choice_id).copied().unwrap_or(0),
    })
    .collect();

  let total = choices.iter().map(|c| c.votes).sum();

  Tally {
    question_id: question.question_id,
    question: question.text.clone(),
    choices,
    total,
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::question::Choice;

  fn question_with(texts: &[&str]) -> Question {
    let question_id = Uuid::new_v4();
    Question {
      question_id,
      text: "Best editor?".into(),
      pub_date: Utc::now(),
      end_date: None,
      choices: texts
        .iter()
        .enumerate()
        .map(|(i, t)| Choice {
          choice_id: Uuid::new_v4(),
          question_id,
          text: (*t).into(),
          position: i as u32,
        })
        .collect(),
    }
  }

  #[test]
  fn missing_rows_count_as_zero() {
    let q = question_with(&["vim", "emacs", "nano"]);
    let t = tally(&q, &[(q.choices[1].choice_id, 4)]);

    let votes: Vec<u64> = t.choices.iter().map(|c| c.votes).collect();
    assert_eq!(votes, [0, 4, 0]);
    assert_eq!(t.total, 4);
  }

  #[test]
  fn foreign_choice_rows_are_ignored() {
    let q = question_with(&["yes", "no"]);
    let t = tally(&q, &[
      (q.choices[0].choice_id, 2),
      (Uuid::new_v4(), 10),
    ]);
    assert_eq!(t.total, 2);
    assert_eq!(t.votes_for(q.choices[0].choice_id), Some(2));
    assert_eq!(t.votes_for(q.choices[1].choice_id), Some(0));
  }

  #[test]
  fn preserves_display_order() {
    let q = question_with(&["a", "b", "c"]);
    let t = tally(&q, &[]);
    let texts: Vec<&str> = t.choices.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["a", "b", "c"]);
  }
}
