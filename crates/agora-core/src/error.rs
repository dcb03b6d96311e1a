//! Error types for `agora-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("question not found: {0}")]
  QuestionNotFound(Uuid),

  #[error("choice not found: {0}")]
  ChoiceNotFound(Uuid),

  #[error("invalid {field}: {reason}")]
  InvalidText {
    field:  &'static str,
    reason: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
