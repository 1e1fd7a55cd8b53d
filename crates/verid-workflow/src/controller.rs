//! [`WorkflowController`]: the verification state machine.
//!
//! ```text
//! AwaitingSelfie ─capture─▶ AwaitingDocument ─capture─▶ Transmitting
//!       ▲                                                   │ transmit
//!       │ retry (capture lost)                              ▼
//!    Failed ◀──────────── any failure ─────────────── Interpreting
//!       │ retry (same evidence)                             │
//!       └──────────────────▶ Transmitting        Complete ◀─┘
//! ```
//!
//! Every operation returns a [`WorkflowState`] snapshot. Failures of the
//! pipeline itself land in [`WorkflowState::last_error`]; only misuse of the
//! controller (wrong step, a second transmit while one is in flight, a
//! response for an abandoned session) is returned as an `Err`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;
use verid_core::{
  Error, Result,
  backend::{PayloadEncoder, VerificationBackend},
  evidence::{EvidenceItem, EvidenceKind, VerificationRequest},
  fields::ExtractedIdentityFields,
  record::{RecordPatch, UserIdentityRecord},
  response::{DocumentStatus, VerificationResponse},
  store::KeyValueStore,
  workflow::{FailureKind, WorkflowFailure, WorkflowStep},
};

use crate::records::IdentityRecordStore;

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything a presentation layer needs to render the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
  /// Changes on every [`WorkflowController::reset`].
  pub session_id:          Uuid,
  pub step:                WorkflowStep,
  /// Transmit attempts since the evidence was last captured.
  pub attempts:            u32,
  /// A transmit or interpretation is outstanding.
  pub in_flight:           bool,
  pub last_error:          Option<WorkflowFailure>,
  pub response:            Option<VerificationResponse>,
  pub fields:              Option<ExtractedIdentityFields>,
  pub document_status:     Option<DocumentStatus>,
  pub confidence:          Option<f64>,
  /// The record as merged by the last verification of this session.
  pub record:              Option<UserIdentityRecord>,
  /// Set when the merged record could not be written.
  pub persistence_warning: Option<WorkflowFailure>,
}

impl WorkflowState {
  fn new() -> Self {
    Self {
      session_id:          Uuid::new_v4(),
      step:                WorkflowStep::AwaitingSelfie,
      attempts:            0,
      in_flight:           false,
      last_error:          None,
      response:            None,
      fields:              None,
      document_status:     None,
      confidence:          None,
      record:              None,
      persistence_warning: None,
    }
  }

  pub fn progress(&self) -> f32 { self.step.progress() }
}

struct Inner {
  state:    WorkflowState,
  selfie:   Option<EvidenceItem>,
  document: Option<EvidenceItem>,
  /// Patch whose merge could not be persisted, kept for [`WorkflowController::persist_again`].
  unsaved:  Option<RecordPatch>,
}

impl Inner {
  fn new() -> Self {
    Self {
      state:    WorkflowState::new(),
      selfie:   None,
      document: None,
      unsaved:  None,
    }
  }

  fn fail(&mut self, err: &Error, during: WorkflowStep) {
    tracing::warn!(
      session = %self.state.session_id,
      kind = %err.kind(),
      %during,
      error = %err,
      "verification failed"
    );
    self.state.step = WorkflowStep::Failed;
    self.state.in_flight = false;
    self.state.last_error = Some(WorkflowFailure {
      kind:    err.kind(),
      message: err.to_string(),
      during,
    });
  }

  fn check_session(&self, session: Uuid) -> Result<()> {
    if self.state.session_id == session {
      return Ok(());
    }
    tracing::warn!(%session, current = %self.state.session_id, "discarding stale response");
    Err(Error::StaleResponse(session))
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Drives one user through capture, transmission, interpretation and
/// persistence.
pub struct WorkflowController<B, E, S> {
  backend: B,
  encoder: E,
  records: Arc<IdentityRecordStore<S>>,
  inner:   Mutex<Inner>,
}

impl<B, E, S> WorkflowController<B, E, S>
where
  B: VerificationBackend,
  E: PayloadEncoder,
  S: KeyValueStore,
{
  pub fn new(backend: B, encoder: E, records: Arc<IdentityRecordStore<S>>) -> Self {
    Self {
      backend,
      encoder,
      records,
      inner: Mutex::new(Inner::new()),
    }
  }

  pub fn backend(&self) -> &B { &self.backend }

  /// The record store this controller merges into.
  pub fn records(&self) -> &Arc<IdentityRecordStore<S>> { &self.records }

  pub async fn state(&self) -> WorkflowState { self.inner.lock().await.state.clone() }

  /// Accept a captured image. The selfie comes first, then the document.
  pub async fn capture(&self, item: EvidenceItem) -> Result<WorkflowState> {
    let mut inner = self.inner.lock().await;
    let step = inner.state.step;
    match (step, item.kind) {
      (WorkflowStep::AwaitingSelfie, EvidenceKind::Selfie) => {
        inner.selfie = Some(item);
        inner.state.step = WorkflowStep::AwaitingDocument;
      }
      (WorkflowStep::AwaitingDocument, EvidenceKind::Document) => {
        inner.document = Some(item);
        inner.state.step = WorkflowStep::Transmitting;
        inner.state.attempts = 0;
      }
      (_, kind) => {
        return Err(Error::InvalidTransition {
          step,
          action: match kind {
            EvidenceKind::Selfie => "capture a selfie",
            EvidenceKind::Document => "capture a document",
          },
        });
      }
    }
    tracing::debug!(session = %inner.state.session_id, step = %inner.state.step, "evidence captured");
    Ok(inner.state.clone())
  }

  /// Probe the service, encode both captures, submit them, interpret the
  /// response and merge it into the identity record.
  ///
  /// A response where the face did not match still completes the workflow;
  /// only errors lead to `Failed`.
  pub async fn transmit(&self) -> Result<WorkflowState> {
    let (session, document, selfie) = {
      let mut inner = self.inner.lock().await;
      if inner.state.in_flight {
        return Err(Error::Busy);
      }
      if inner.state.step != WorkflowStep::Transmitting {
        return Err(Error::InvalidTransition {
          step:   inner.state.step,
          action: "transmit",
        });
      }
      let (Some(document), Some(selfie)) = (inner.document.clone(), inner.selfie.clone()) else {
        let err = Error::InvalidRequest("evidence missing; capture again".into());
        inner.fail(&err, WorkflowStep::Transmitting);
        return Ok(inner.state.clone());
      };
      inner.state.in_flight = true;
      inner.state.attempts += 1;
      inner.state.last_error = None;
      tracing::info!(session = %inner.state.session_id, attempt = inner.state.attempts, "transmitting");
      (inner.state.session_id, document, selfie)
    };

    let outcome = self.exchange(&document, &selfie).await;

    let response = {
      let mut inner = self.inner.lock().await;
      inner.check_session(session)?;
      match outcome {
        Ok(response) => {
          inner.state.step = WorkflowStep::Interpreting;
          response
        }
        Err(err) => {
          inner.fail(&err, WorkflowStep::Transmitting);
          return Ok(inner.state.clone());
        }
      }
    };

    let interpretation = verid_extract::interpret(&response);
    let patch = interpretation
      .patch
      .with_captured_at(latest_capture(&document, &selfie));

    self.inner.lock().await.check_session(session)?;
    let saved = self.records.merge(patch.clone()).await;

    let mut inner = self.inner.lock().await;
    inner.check_session(session)?;
    let (record, warning) = match saved {
      Ok(record) => {
        inner.unsaved = None;
        (record, None)
      }
      Err(unsaved) => {
        tracing::warn!(error = %unsaved.error, "identity record not saved; keeping it in memory");
        inner.unsaved = Some(patch);
        let warning = WorkflowFailure {
          kind:    FailureKind::Persistence,
          message: unsaved.error.to_string(),
          during:  WorkflowStep::Interpreting,
        };
        (unsaved.record, Some(warning))
      }
    };

    tracing::info!(
      session = %session,
      verification_id = %response.verification_id,
      verified = interpretation.is_verified,
      confidence = interpretation.confidence,
      "verification complete"
    );

    let state = &mut inner.state;
    state.step = WorkflowStep::Complete;
    state.in_flight = false;
    state.fields = Some(interpretation.fields);
    state.document_status = Some(interpretation.document_status);
    state.confidence = Some(interpretation.confidence);
    state.response = Some(response);
    state.record = Some(record);
    state.persistence_warning = warning;
    Ok(state.clone())
  }

  /// Leave `Failed` for the step the failure calls for.
  ///
  /// Failures that leave the captures unusable go back to capture; anything
  /// else re-enters `Transmitting` with the same evidence.
  pub async fn retry(&self) -> Result<WorkflowState> {
    let mut inner = self.inner.lock().await;
    if inner.state.step != WorkflowStep::Failed {
      return Err(Error::InvalidTransition {
        step:   inner.state.step,
        action: "retry",
      });
    }

    let target = inner
      .state
      .last_error
      .as_ref()
      .map_or(WorkflowStep::Transmitting, WorkflowFailure::retry_target);
    if target == WorkflowStep::AwaitingSelfie {
      inner.selfie = None;
      inner.document = None;
      inner.state.attempts = 0;
    }
    inner.state.step = target;
    inner.state.last_error = None;
    tracing::debug!(session = %inner.state.session_id, step = %target, "retrying");
    Ok(inner.state.clone())
  }

  /// Abandon the current session and start over. A transmit still in flight
  /// will have its response discarded.
  pub async fn reset(&self) -> WorkflowState {
    let mut inner = self.inner.lock().await;
    *inner = Inner::new();
    tracing::debug!(session = %inner.state.session_id, "workflow reset");
    inner.state.clone()
  }

  /// Try again to save a record whose earlier write failed.
  pub async fn persist_again(&self) -> Result<WorkflowState> {
    let (session, patch) = {
      let inner = self.inner.lock().await;
      let Some(patch) = inner.unsaved.clone() else {
        return Ok(inner.state.clone());
      };
      (inner.state.session_id, patch)
    };

    let saved = self.records.merge(patch).await;

    let mut inner = self.inner.lock().await;
    inner.check_session(session)?;
    match saved {
      Ok(record) => {
        inner.unsaved = None;
        inner.state.record = Some(record);
        inner.state.persistence_warning = None;
        Ok(inner.state.clone())
      }
      Err(unsaved) => Err(unsaved.error),
    }
  }

  async fn exchange(
    &self,
    document: &EvidenceItem,
    selfie: &EvidenceItem,
  ) -> Result<VerificationResponse> {
    if !self.backend.test_connection().await {
      return Err(Error::NetworkUnavailable(
        "verification service did not answer the connectivity probe".into(),
      ));
    }
    let document = self.encoder.encode(&document.handle).await?;
    let selfie = self.encoder.encode(&selfie.handle).await?;
    self
      .backend
      .submit(&VerificationRequest::new(document, selfie))
      .await
  }
}

fn latest_capture(a: &EvidenceItem, b: &EvidenceItem) -> DateTime<Utc> {
  a.captured_at.max(b.captured_at)
}
