//! JSON REST API for Agora.
//!
//! Exposes an axum [`Router`] backed by any [`agora_core::store::PollStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; the voter's identity arrives in a trusted header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(agora_api::api_router(state))
//! ```

pub mod error;
pub mod identity;
pub mod questions;
pub mod votes;

use agora_core::{service::Polls, store::PollStore};
use axum::{
  Router,
  http::HeaderName,
  routing::{get, post},
};

pub use error::ApiError;

/// Header consulted for the voter id when none is configured.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-remote-user";

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub polls:           Polls<S>,
  /// Trusted header carrying the authenticated user's id.
  pub identity_header: HeaderName,
}

impl<S> AppState<S> {
  pub fn new(polls: Polls<S>) -> Self {
    Self {
      polls,
      identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
    }
  }

  pub fn with_identity_header(mut self, header: HeaderName) -> Self {
    self.identity_header = header;
    self
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      polls:           self.polls.clone(),
      identity_header: self.identity_header.clone(),
    }
  }
}

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: PollStore + 'static,
{
  Router::new()
    .route("/questions", get(questions::list::<S>))
    .route("/questions/{id}", get(questions::get_one::<S>))
    .route("/questions/{id}/vote", post(votes::cast::<S>))
    .route("/questions/{id}/results", get(questions::results::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
