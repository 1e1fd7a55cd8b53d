//! Error types for `verid-core`.
//!
//! One enum covers the whole failure taxonomy so the workflow controller can
//! classify any failure without knowing which component raised it.

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::{FailureKind, WorkflowStep};

#[derive(Debug, Error)]
pub enum Error {
  /// The capture handle does not resolve to existing data. Recoverable only
  /// by capturing again.
  #[error("captured image not found at {0}")]
  ResourceNotFound(String),

  #[error("could not encode captured image: {0}")]
  Encoding(String),

  #[error("invalid verification request: {0}")]
  InvalidRequest(String),

  #[error("verification service unreachable: {0}")]
  NetworkUnavailable(String),

  #[error("verification service returned {status}: {body}")]
  Server { status: u16, body: String },

  #[error("verification service sent an unexpected response: {0}")]
  MalformedResponse(String),

  #[error("could not save identity record: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid configuration: {0}")]
  Configuration(String),

  #[error("evidence rejected: {0}")]
  InvalidEvidence(String),

  #[error("cannot {action} while {step}")]
  InvalidTransition {
    step:   WorkflowStep,
    action: &'static str,
  },

  #[error("a verification is already in progress")]
  Busy,

  #[error("response for abandoned workflow {0} discarded")]
  StaleResponse(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap any storage backend error as a persistence failure.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }

  pub fn kind(&self) -> FailureKind {
    match self {
      Self::ResourceNotFound(_) => FailureKind::ResourceNotFound,
      Self::Encoding(_) => FailureKind::Encoding,
      Self::InvalidRequest(_) => FailureKind::InvalidRequest,
      Self::NetworkUnavailable(_) => FailureKind::NetworkUnavailable,
      Self::Server { .. } => FailureKind::Server,
      Self::MalformedResponse(_) => FailureKind::MalformedResponse,
      Self::Persistence(_) | Self::Serialization(_) => FailureKind::Persistence,
      Self::Configuration(_)
      | Self::InvalidEvidence(_)
      | Self::InvalidTransition { .. }
      | Self::Busy
      | Self::StaleResponse(_) => FailureKind::Workflow,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
