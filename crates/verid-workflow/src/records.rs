//! [`IdentityRecordStore`]: load/merge access to the persisted identity
//! record.
//!
//! Merges are read-modify-write over the same durable slots, so every writer
//! goes through one async mutex.

use thiserror::Error;
use tokio::sync::Mutex;
use verid_core::{
  Error, Result,
  fields::ExtractedIdentityFields,
  record::{RecordPatch, UserIdentityRecord},
  response::VerificationResponse,
  store::{KeyValueStore, USER_DATA_KEY, VERIFICATION_RESULT_KEY},
};

/// A merge whose result could not be written.
///
/// The merged record is still returned so the session can continue with it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Unpersisted {
  pub record: UserIdentityRecord,
  #[source]
  pub error:  Error,
}

/// Service over a [`KeyValueStore`] holding the identity record and the raw
/// response it was last merged from.
pub struct IdentityRecordStore<S> {
  store: S,
  write: Mutex<()>,
}

impl<S: KeyValueStore> IdentityRecordStore<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      write: Mutex::new(()),
    }
  }

  /// The current record, or the default record if none has been saved.
  pub async fn load(&self) -> Result<UserIdentityRecord> {
    Ok(self.read_record().await?.unwrap_or_default())
  }

  /// Merge `patch` into the stored record and persist both the record and
  /// the raw response it came from.
  pub async fn merge(&self, patch: RecordPatch) -> Result<UserIdentityRecord, Unpersisted> {
    let _guard = self.write.lock().await;

    let previous = match self.read_record().await {
      Ok(previous) => previous,
      Err(error) => {
        // Writing now could clobber a user-set name we failed to read.
        let record = UserIdentityRecord::merge(None, patch);
        return Err(Unpersisted { record, error });
      }
    };

    let raw = patch.verification.clone();
    let record = UserIdentityRecord::merge(previous.as_ref(), patch);
    match self.write_all(&raw, &record).await {
      Ok(()) => {
        tracing::debug!(revision = record.revision, "identity record saved");
        Ok(record)
      }
      Err(error) => Err(Unpersisted { record, error }),
    }
  }

  /// Set a user-chosen display name. Later verifications will not replace it.
  pub async fn set_display_name(&self, name: &str) -> Result<UserIdentityRecord> {
    let _guard = self.write.lock().await;
    let record = self.read_record().await?.unwrap_or_default().with_user_name(name)?;
    self
      .store
      .put(USER_DATA_KEY, serde_json::to_string(&record)?)
      .await
      .map_err(Error::persistence)?;
    Ok(record)
  }

  /// The raw response of the most recent verification, if any.
  pub async fn latest_verification(&self) -> Result<Option<VerificationResponse>> {
    let raw = self
      .store
      .get(VERIFICATION_RESULT_KEY)
      .await
      .map_err(Error::persistence)?;
    raw.map(|json| serde_json::from_str(&json).map_err(Error::from)).transpose()
  }

  /// Fields extracted from the most recent verification; empty if none.
  pub async fn latest_fields(&self) -> Result<ExtractedIdentityFields> {
    Ok(
      self
        .latest_verification()
        .await?
        .map(|resp| verid_extract::extract_fields(&resp.extracted_info))
        .unwrap_or_default(),
    )
  }

  /// Remove the record and the stored response.
  pub async fn clear(&self) -> Result<()> {
    let _guard = self.write.lock().await;
    self.store.clear().await.map_err(Error::persistence)
  }

  async fn read_record(&self) -> Result<Option<UserIdentityRecord>> {
    let Some(json) = self.store.get(USER_DATA_KEY).await.map_err(Error::persistence)? else {
      return Ok(None);
    };
    match serde_json::from_str(&json) {
      Ok(record) => Ok(Some(record)),
      Err(e) => {
        tracing::warn!(error = %e, "stored identity record is unreadable; starting fresh");
        Ok(None)
      }
    }
  }

  async fn write_all(&self, raw: &VerificationResponse, record: &UserIdentityRecord) -> Result<()> {
    let entries = vec![
      (VERIFICATION_RESULT_KEY.to_owned(), serde_json::to_string(raw)?),
      (USER_DATA_KEY.to_owned(), serde_json::to_string(record)?),
    ];
    self.store.put_many(entries).await.map_err(Error::persistence)
  }
}
