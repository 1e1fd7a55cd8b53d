//! The `KeyValueStore` trait: durable, device-local JSON slots.
//!
//! Implemented by storage backends (e.g. `verid-store-sqlite`). The identity
//! record service in `verid-workflow` depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

/// Slot holding the most recent raw verification response.
pub const VERIFICATION_RESULT_KEY: &str = "verificationResult";

/// Slot holding the merged [`UserIdentityRecord`](crate::record::UserIdentityRecord).
pub const USER_DATA_KEY: &str = "userData";

/// Abstraction over a string-keyed, string-valued durable store.
///
/// Values are opaque to the store; callers serialise them as JSON.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a slot. Returns `None` if it has never been written or was removed.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Create or overwrite a slot.
  fn put<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Write several slots atomically.
  fn put_many(
    &self,
    entries: Vec<(String, String)>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a slot. Removing a missing slot is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove every slot.
  fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
