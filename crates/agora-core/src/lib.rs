//! Core types and voting logic for the Agora polling service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PollStore`]; the HTTP layer drives
//! everything through the [`service::Polls`] facade.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod eligibility;
pub mod error;
pub mod ledger;
pub mod question;
pub mod results;
pub mod service;
pub mod store;
pub mod vote;

pub use error::{Error, Result};
