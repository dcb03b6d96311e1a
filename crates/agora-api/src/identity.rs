//! Voter identity extractors.
//!
//! Authentication happens upstream. The identity provider (a reverse proxy or
//! gateway) sets a trusted header carrying the user's opaque id; these
//! extractors only read it.

use std::convert::Infallible;

use agora_core::{store::PollStore, vote::UserId};
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, error::ApiError};

/// An identified voter. Rejects with `401` when the header is missing or
/// empty.
pub struct Voter(pub UserId);

/// The voter, if the request carries an identity.
pub struct MaybeVoter(pub Option<UserId>);

fn read_identity<S>(parts: &Parts, state: &AppState<S>) -> Option<UserId> {
  parts
    .headers
    .get(&state.identity_header)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| UserId::new(s.trim()))
}

impl<S> FromRequestParts<AppState<S>> for Voter
where
  S: PollStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    read_identity(parts, state)
      .map(Voter)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeVoter
where
  S: PollStore + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeVoter(read_identity(parts, state)))
  }
}
