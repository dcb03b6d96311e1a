//! Handler for `POST /questions/:id/vote`.
//!
//! Body: `{"choice": "<uuid>"}`. The voter is identified by the trusted
//! identity header (see [`crate::identity`]). A missing body, or a choice
//! that is not a UUID, is a ballot without a choice.

use agora_core::{
  ledger::VoteOutcome,
  store::PollStore,
  vote::{BallotChange, Vote},
};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Voter};

#[derive(Debug, Default, Deserialize)]
pub struct VoteBody {
  /// Kept as text so an unparseable id reaches the ledger as "no choice".
  #[serde(default)]
  pub choice: Option<String>,
}

impl VoteBody {
  pub fn choice_id(&self) -> Option<Uuid> {
    self
      .choice
      .as_deref()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
  }
}

#[derive(Debug, Serialize)]
pub struct VoteReceipt {
  pub vote:    Vote,
  pub change:  BallotChange,
  /// Where the updated tally can be read.
  pub results: String,
}

/// `POST /questions/:id/vote`
pub async fn cast<S>(
  State(state): State<AppState<S>>,
  Voter(user): Voter,
  Path(question_id): Path<Uuid>,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<VoteReceipt>, ApiError>
where
  S: PollStore + 'static,
{
  let body = body.map(|Json(b)| b).unwrap_or_else(|rejection| {
    tracing::debug!(%rejection, "unreadable ballot body");
    VoteBody::default()
  });

  let outcome = state
    .polls
    .cast_vote(&user, question_id, body.choice_id())
    .await
    .map_err(ApiError::store)?;

  match outcome {
    VoteOutcome::Recorded { vote, change } => {
      tracing::info!(
        question = %question_id,
        choice = %vote.choice_id,
        user = %user,
        ?change,
        "vote recorded"
      );
      Ok(Json(VoteReceipt {
        vote,
        change,
        results: format!("/questions/{question_id}/results"),
      }))
    }
    VoteOutcome::InvalidChoice => {
      tracing::warn!(question = %question_id, user = %user, "ballot without a valid choice");
      Err(ApiError::InvalidChoice("You didn't select a choice.".into()))
    }
    VoteOutcome::VotingClosed => {
      tracing::warn!(question = %question_id, user = %user, "ballot outside voting window");
      Err(ApiError::VotingClosed("Voting for this poll is not allowed.".into()))
    }
    VoteOutcome::QuestionNotFound => {
      Err(ApiError::NotFound(format!("question {question_id} not found")))
    }
  }
}
