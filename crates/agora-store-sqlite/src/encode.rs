//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order in SQL equals chronological
//! order. UUIDs are stored as hyphenated lowercase strings.

use agora_core::{
  question::{Choice, Question},
  vote::{UserId, Vote},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// Raw strings read from a `questions` row, decoded outside the database
/// thread.
pub struct RawQuestion {
  pub question_id: String,
  pub text:        String,
  pub pub_date:    String,
  pub end_date:    Option<String>,
}

impl RawQuestion {
  pub fn into_question(self, choices: Vec<Choice>) -> Result<Question> {
    Ok(Question {
      question_id: decode_uuid(&self.question_id)?,
      text:        self.text,
      pub_date:    decode_dt(&self.pub_date)?,
      end_date:    self.end_date.as_deref().map(decode_dt).transpose()?,
      choices,
    })
  }
}

pub struct RawChoice {
  pub choice_id:   String,
  pub question_id: String,
  pub text:        String,
  pub position:    i64,
}

impl RawChoice {
  pub fn into_choice(self) -> Result<Choice> {
    Ok(Choice {
      choice_id:   decode_uuid(&self.choice_id)?,
      question_id: decode_uuid(&self.question_id)?,
      text:        self.text,
      position:    u32::try_from(self.position)
        .map_err(|_| Error::Corrupt(format!("invalid choice position: {}", self.position)))?,
    })
  }
}

pub struct RawVote {
  pub vote_id:     String,
  pub user_id:     String,
  pub question_id: String,
  pub choice_id:   String,
  pub cast_at:     String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:     row.get(0)?,
      user_id:     row.get(1)?,
      question_id: row.get(2)?,
      choice_id:   row.get(3)?,
      cast_at:     row.get(4)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:     decode_uuid(&self.vote_id)?,
      // Rows are only ever written from a validated `UserId`.
      user_id:     UserId::new(self.user_id)
        .ok_or_else(|| Error::Corrupt("blank user id in votes table".into()))?,
      question_id: decode_uuid(&self.question_id)?,
      choice_id:   decode_uuid(&self.choice_id)?,
      cast_at:     decode_dt(&self.cast_at)?,
    })
  }
}
