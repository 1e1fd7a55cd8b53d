//! Seams to the outside world: the payload encoder and the verification
//! service.
//!
//! `verid-client` provides the production implementations; the workflow
//! controller is generic over both so it can be driven by fakes in tests.

use std::future::Future;

use crate::{
  Result,
  evidence::{EncodedPayload, ResourceHandle, VerificationRequest},
  response::{HealthStatus, VerificationResponse},
};

/// Turns a captured resource into a transport-safe payload.
pub trait PayloadEncoder: Send + Sync {
  /// Read and encode the resource at `handle`.
  ///
  /// Fails with [`Error::ResourceNotFound`](crate::Error::ResourceNotFound)
  /// when the handle does not resolve, and
  /// [`Error::Encoding`](crate::Error::Encoding) when it cannot be read or is
  /// not a supported image. Never modifies the resource.
  fn encode<'a>(
    &'a self,
    handle: &'a ResourceHandle,
  ) -> impl Future<Output = Result<EncodedPayload>> + Send + 'a;
}

/// The remote verification service.
///
/// Implementations never retry; retry policy belongs to the caller.
pub trait VerificationBackend: Send + Sync {
  /// Lightweight reachability check, independent of the verification
  /// endpoint. Never fails; unreachable is `false`.
  fn test_connection(&self) -> impl Future<Output = bool> + Send + '_;

  /// Query the service's own health report.
  fn health_check(&self) -> impl Future<Output = Result<HealthStatus>> + Send + '_;

  /// Submit both payloads in a single request.
  ///
  /// Fails with [`Error::InvalidRequest`](crate::Error::InvalidRequest)
  /// before any network I/O if either payload is missing.
  fn submit<'a>(
    &'a self,
    request: &'a VerificationRequest,
  ) -> impl Future<Output = Result<VerificationResponse>> + Send + 'a;
}
