//! Agora HTTP server: configuration, router assembly and administrative
//! helpers shared by the `agora` binary.

pub mod admin;
pub mod config;

use agora_api::AppState;
use agora_core::store::PollStore;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

/// The full application: API routes, a liveness probe, and request tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: PollStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .merge(agora_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use agora_core::{clock::SystemClock, service::Polls};
  use agora_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  async fn state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Polls::new(Arc::new(store), Arc::new(SystemClock)))
  }

  #[tokio::test]
  async fn health_returns_ok() {
    let req  = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app(state().await).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
  }

  #[tokio::test]
  async fn api_routes_are_mounted() {
    let req  = Request::builder().uri("/questions").body(Body::empty()).unwrap();
    let resp = app(state().await).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
