//! Workflow step and failure classification types.
//!
//! The state machine itself lives in `verid-workflow`; these types are shared
//! so that errors can name the step they were raised in.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator as _};

// ─── Step ────────────────────────────────────────────────────────────────────

/// Where a verification workflow currently stands.
///
/// Transitions are linear (`AwaitingSelfie → AwaitingDocument → Transmitting →
/// Interpreting → Complete`) except `Failed`, which a retry leaves for an
/// earlier step.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStep {
  AwaitingSelfie,
  AwaitingDocument,
  Transmitting,
  Interpreting,
  Complete,
  Failed,
}

impl WorkflowStep {
  /// Fraction of the happy path completed, in `[0, 1]`.
  ///
  /// `Failed` reports no progress; the UI shows the error instead.
  pub fn progress(self) -> f32 {
    let total = (Self::iter().count() - 2) as f32;
    match self {
      Self::Failed => 0.0,
      step => Self::iter().position(|s| s == step).unwrap_or(0) as f32 / total,
    }
  }

  /// Whether a network request or interpretation may be outstanding.
  pub fn is_busy(self) -> bool {
    matches!(self, Self::Transmitting | Self::Interpreting)
  }
}

// ─── Failure classification ──────────────────────────────────────────────────

/// Classification of a workflow failure, decoupled from the error value so it
/// can be stored, compared and serialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
  ResourceNotFound,
  Encoding,
  InvalidRequest,
  NetworkUnavailable,
  Server,
  MalformedResponse,
  Persistence,
  /// Controller misuse (wrong step, concurrent trigger, stale response) or
  /// invalid setup.
  Workflow,
}

impl FailureKind {
  /// The step a user-initiated retry re-enters.
  ///
  /// Capture handles that no longer resolve cannot be re-encoded, so those
  /// failures restart capture; everything else re-sends the same evidence.
  pub fn retry_target(self) -> WorkflowStep {
    match self {
      Self::ResourceNotFound | Self::InvalidRequest => WorkflowStep::AwaitingSelfie,
      _ => WorkflowStep::Transmitting,
    }
  }
}

/// A classified failure as exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFailure {
  pub kind:    FailureKind,
  /// Human-readable message suitable for display.
  pub message: String,
  /// The step that was running when the failure occurred.
  pub during:  WorkflowStep,
}

impl WorkflowFailure {
  pub fn retry_target(&self) -> WorkflowStep { self.kind.retry_target() }
}
