//! Handlers for the read side of `/questions`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/questions` | Latest published questions, newest first |
//! | `GET`  | `/questions/:id` | 404 if missing or not yet published |
//! | `GET`  | `/questions/:id/results` | Per-choice vote counts |

use agora_core::{
  eligibility::VotingWindow,
  question::{Choice, Question},
  results::Tally,
  store::PollStore,
};
use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::MaybeVoter};

// ─── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuestionBody {
  pub question_id:        Uuid,
  pub text:               String,
  pub pub_date:           DateTime<Utc>,
  pub end_date:           Option<DateTime<Utc>>,
  pub voting:             VotingWindow,
  pub recently_published: bool,
  pub choices:            Vec<Choice>,
}

impl QuestionBody {
  fn new<S: PollStore>(state: &AppState<S>, q: Question) -> Self {
    Self {
      voting:             state.polls.voting_status(&q),
      recently_published: state.polls.was_published_recently(&q),
      question_id:        q.question_id,
      text:               q.text,
      pub_date:           q.pub_date,
      end_date:           q.end_date,
      choices:            q.choices,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct DetailBody {
  #[serde(flatten)]
  pub question:  QuestionBody,
  /// The caller's current choice, when the request carries an identity.
  pub my_choice: Option<Uuid>,
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

pub(crate) async fn resolve<S: PollStore>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<Question, ApiError> {
  state
    .polls
    .get_question(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("question {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /questions`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<QuestionBody>>, ApiError>
where
  S: PollStore + 'static,
{
  let questions = state
    .polls
    .list_published_questions()
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(count = questions.len(), "listed published questions");

  Ok(Json(
    questions
      .into_iter()
      .map(|q| QuestionBody::new(&state, q))
      .collect(),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /questions/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  MaybeVoter(voter): MaybeVoter,
  Path(id): Path<Uuid>,
) -> Result<Json<DetailBody>, ApiError>
where
  S: PollStore + 'static,
{
  let question = resolve(&state, id).await?;

  let my_choice = match &voter {
    Some(user) => state
      .polls
      .my_vote(user, id)
      .await
      .map_err(ApiError::store)?
      .map(|v| v.choice_id),
    None => None,
  };

  Ok(Json(DetailBody {
    question: QuestionBody::new(&state, question),
    my_choice,
  }))
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// `GET /questions/:id/results`
///
/// Tallies are only shown for published questions; anything else is a 404,
/// matching the detail view.
pub async fn results<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tally>, ApiError>
where
  S: PollStore + 'static,
{
  let question = resolve(&state, id).await?;
  let tally = state
    .polls
    .results_for(&question)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tally))
}
