//! [`SqliteStore`] — the SQLite implementation of [`PollStore`].

use std::{path::Path, time::Duration};

use agora_core::{
  question::{Choice, NewQuestion, Question, validate_text},
  store::PollStore,
  vote::{BallotChange, RecordedVote, UserId, Vote, VoteWrite},
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawChoice, RawQuestion, RawVote, decode_uuid, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// How long a write waits on a locked database before failing with a
/// transient `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

// ─── Row helpers (run on the database thread) ────────────────────────────────

const QUESTION_COLUMNS: &str = "question_id, text, pub_date, end_date";

fn raw_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawQuestion> {
  Ok(RawQuestion {
    question_id: row.get(0)?,
    text:        row.get(1)?,
    pub_date:    row.get(2)?,
    end_date:    row.get(3)?,
  })
}

fn raw_choices(
  conn: &rusqlite::Connection,
  question_id: &str,
) -> rusqlite::Result<Vec<RawChoice>> {
  let mut stmt = conn.prepare_cached(
    "SELECT choice_id, question_id, text, position
     FROM choices
     WHERE question_id = ?1
     ORDER BY position",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![question_id], |row| {
      Ok(RawChoice {
        choice_id:   row.get(0)?,
        question_id: row.get(1)?,
        text:        row.get(2)?,
        position:    row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn assemble(raw: RawQuestion, choices: Vec<RawChoice>) -> Result<Question> {
  let choices = choices
    .into_iter()
    .map(RawChoice::into_choice)
    .collect::<Result<Vec<_>>>()?;
  raw.into_question(choices)
}

/// Outcome of the upsert transaction, still in raw form.
enum RawUpsert {
  Mismatch,
  Written {
    vote:     RawVote,
    previous: Option<String>,
  },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora poll store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total number of vote rows for a question. Used to check the
  /// one-vote-per-user invariant.
  pub async fn votes_for_question(&self, question_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(question_id);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE question_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }
}

// ─── PollStore impl ──────────────────────────────────────────────────────────

impl PollStore for SqliteStore {
  type Error = Error;

  // ── Questions and choices ─────────────────────────────────────────────────

  async fn create_question(&self, input: NewQuestion) -> Result<Question> {
    input.validate()?;

    let question_id = Uuid::new_v4();
    let choices: Vec<Choice> = input
      .choices
      .iter()
      .enumerate()
      .map(|(i, text)| Choice {
        choice_id: Uuid::new_v4(),
        question_id,
        text: text.clone(),
        position: i as u32,
      })
      .collect();

    let question = Question {
      question_id,
      text: input.text,
      pub_date: input.pub_date,
      end_date: input.end_date,
      choices,
    };

    let id_str   = encode_uuid(question.question_id);
    let text     = question.text.clone();
    let pub_str  = encode_dt(question.pub_date);
    let end_str  = question.end_date.map(encode_dt);
    let choice_rows: Vec<(String, String, i64)> = question
      .choices
      .iter()
      .map(|c| (encode_uuid(c.choice_id), c.text.clone(), i64::from(c.position)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO questions (question_id, text, pub_date, end_date)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, text, pub_str, end_str],
        )?;
        for (choice_id, choice_text, position) in choice_rows {
          tx.execute(
            "INSERT INTO choices (choice_id, question_id, text, position)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![choice_id, id_str, choice_text, position],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  async fn add_choice(&self, question_id: Uuid, text: String) -> Result<Choice> {
    validate_text("choice text", &text)?;

    let choice_id   = Uuid::new_v4();
    let id_str      = encode_uuid(choice_id);
    let q_str       = encode_uuid(question_id);
    let choice_text = text.clone();

    let position: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM questions WHERE question_id = ?1",
            rusqlite::params![q_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let position: i64 = tx.query_row(
          "SELECT COALESCE(MAX(position) + 1, 0) FROM choices WHERE question_id = ?1",
          rusqlite::params![q_str],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO choices (choice_id, question_id, text, position)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, q_str, choice_text, position],
        )?;
        tx.commit()?;
        Ok(Some(position))
      })
      .await?;

    let position = position.ok_or(Error::QuestionNotFound(question_id))?;
    Ok(Choice {
      choice_id,
      question_id,
      text,
      position: u32::try_from(position)
        .map_err(|_| Error::Corrupt(format!("invalid choice position: {position}")))?,
    })
  }

  async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawQuestion, Vec<RawChoice>)> = self
      .conn
      .call(move |conn| {
        let question = conn
          .query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE question_id = ?1"),
            rusqlite::params![id_str],
            raw_question,
          )
          .optional()?;
        match question {
          Some(q) => {
            let choices = raw_choices(conn, &id_str)?;
            Ok(Some((q, choices)))
          }
          None => Ok(None),
        }
      })
      .await?;

    raw.map(|(q, choices)| assemble(q, choices)).transpose()
  }

  async fn list_published(
    &self,
    now: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<Question>> {
    let now_str   = encode_dt(now);
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<(RawQuestion, Vec<RawChoice>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_COLUMNS}
           FROM questions
           WHERE pub_date <= ?1
           ORDER BY pub_date DESC
           LIMIT ?2"
        ))?;
        let questions = stmt
          .query_map(rusqlite::params![now_str, limit_val], raw_question)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(questions.len());
        for q in questions {
          let choices = raw_choices(conn, &q.question_id)?;
          out.push((q, choices));
        }
        Ok(out)
      })
      .await?;

    raws
      .into_iter()
      .map(|(q, choices)| assemble(q, choices))
      .collect()
  }

  async fn delete_question(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM questions WHERE question_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn delete_choice(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM choices WHERE choice_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn record_vote(&self, write: VoteWrite) -> Result<RecordedVote> {
    let new_id_str   = encode_uuid(Uuid::new_v4());
    let user_str     = write.user_id.as_str().to_owned();
    let question_str = encode_uuid(write.question_id);
    let choice_str   = encode_uuid(write.choice_id);
    let at_str       = encode_dt(write.cast_at);

    // Membership check, prior-choice read and upsert share one IMMEDIATE
    // transaction, so the write lock is held from the first read.
    let raw: RawUpsert = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let belongs = tx
          .query_row(
            "SELECT 1 FROM choices WHERE choice_id = ?1 AND question_id = ?2",
            rusqlite::params![choice_str, question_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !belongs {
          return Ok(RawUpsert::Mismatch);
        }

        let previous: Option<String> = tx
          .query_row(
            "SELECT choice_id FROM votes WHERE user_id = ?1 AND question_id = ?2",
            rusqlite::params![user_str, question_str],
            |r| r.get(0),
          )
          .optional()?;

        let vote = tx.query_row(
          "INSERT INTO votes (vote_id, user_id, question_id, choice_id, cast_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id, question_id) DO UPDATE
             SET choice_id = excluded.choice_id,
                 cast_at   = excluded.cast_at
           RETURNING vote_id, user_id, question_id, choice_id, cast_at",
          rusqlite::params![new_id_str, user_str, question_str, choice_str, at_str],
          RawVote::from_row,
        )?;

        tx.commit()?;
        Ok(RawUpsert::Written { vote, previous })
      })
      .await?;

    match raw {
      RawUpsert::Mismatch => Ok(RecordedVote::ChoiceMismatch),
      RawUpsert::Written { vote, previous } => {
        let vote     = vote.into_vote()?;
        let previous = previous.as_deref().map(decode_uuid).transpose()?;
        let change   = BallotChange::between(previous, vote.choice_id);
        Ok(RecordedVote::Written { vote, change })
      }
    }
  }

  async fn get_vote(&self, user: &UserId, question_id: Uuid) -> Result<Option<Vote>> {
    let user_str     = user.as_str().to_owned();
    let question_str = encode_uuid(question_id);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT vote_id, user_id, question_id, choice_id, cast_at
             FROM votes
             WHERE user_id = ?1 AND question_id = ?2",
            rusqlite::params![user_str, question_str],
            RawVote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  // ── Aggregation ───────────────────────────────────────────────────────────

  async fn vote_count(&self, choice_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(choice_id);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE choice_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn vote_counts(&self, question_id: Uuid) -> Result<Vec<(Uuid, u64)>> {
    let id_str = encode_uuid(question_id);

    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.choice_id, COUNT(v.vote_id)
           FROM choices c
           LEFT JOIN votes v ON v.choice_id = c.choice_id
           WHERE c.question_id = ?1
           GROUP BY c.choice_id
           ORDER BY c.position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, n)| Ok((decode_uuid(&id)?, n as u64)))
      .collect()
  }
}
