//! Administrative operations behind the CLI subcommands. Question creation
//! and deletion have no HTTP surface.

use agora_core::{
  question::{NewQuestion, Question},
  store::PollStore,
};
use chrono::{DateTime, Utc};

/// Create a question, publishing it at `now` unless `pub_date` says
/// otherwise.
pub async fn add_question<S: PollStore>(
  store: &S,
  text: String,
  choices: Vec<String>,
  pub_date: Option<DateTime<Utc>>,
  end_date: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> Result<Question, S::Error> {
  let input = NewQuestion {
    text,
    pub_date: pub_date.unwrap_or(now),
    end_date,
    choices,
  };

  if input.has_inverted_window() {
    tracing::warn!(
      pub_date = %input.pub_date,
      end_date = ?input.end_date,
      "end date precedes publication; the question will never accept votes"
    );
  }

  let question = store.create_question(input).await?;
  tracing::info!(
    question = %question.question_id,
    choices = question.choices.len(),
    "question created"
  );
  Ok(question)
}

/// Render a question as a block of text for the `list` subcommand.
pub fn describe(question: &Question, votes: &[(uuid::Uuid, u64)]) -> String {
  let tally = agora_core::results::tally(question, votes);
  let mut out = format!(
    "{}  {}\n  published {}",
    question.question_id, question.text, question.pub_date
  );
  match question.end_date {
    Some(end) => out.push_str(&format!(", closes {end}\n")),
    None => out.push_str(", never closes\n"),
  }
  for c in &tally.choices {
    out.push_str(&format!("  - {}  {} ({} votes)\n", c.choice_id, c.text, c.votes));
  }
  out
}
