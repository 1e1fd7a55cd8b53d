//! Async HTTP client for the verification service.

use reqwest::Client;
use serde::Serialize;
use verid_core::{
  Error, Result,
  backend::VerificationBackend,
  evidence::VerificationRequest,
  response::{HealthStatus, VerificationResponse},
};

use crate::config::BackendConfig;

/// Wire body of `POST /id-verify-base64`.
#[derive(Serialize)]
struct VerifyBody<'a> {
  id_card_base64: &'a str,
  selfie_base64:  &'a str,
}

/// HTTP implementation of [`VerificationBackend`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client: Client,
  config: BackendConfig,
}

impl HttpBackend {
  pub fn new(config: BackendConfig) -> Result<Self> {
    reqwest::Url::parse(&config.base_url)
      .map_err(|e| Error::Configuration(format!("base URL {:?}: {e}", config.base_url)))?;
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout() {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url(), path) }
}

impl VerificationBackend for HttpBackend {
  /// `GET /`
  async fn test_connection(&self) -> bool {
    let result = self
      .client
      .get(self.url("/"))
      .timeout(self.config.probe_timeout())
      .send()
      .await;
    match result {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        tracing::debug!(error = %e, "connection probe failed");
        false
      }
    }
  }

  /// `GET /health`
  async fn health_check(&self) -> Result<HealthStatus> {
    let resp = self
      .client
      .get(self.url("/health"))
      .timeout(self.config.probe_timeout())
      .send()
      .await
      .map_err(|e| Error::NetworkUnavailable(format!("GET /health failed: {e}")))?;
    read_json(resp, "/health").await
  }

  /// `POST /id-verify-base64`
  async fn submit(&self, request: &VerificationRequest) -> Result<VerificationResponse> {
    let (document, selfie) = request.validate()?;
    tracing::debug!(
      document = %document.digest,
      selfie = %selfie.digest,
      bytes = document.len() + selfie.len(),
      "submitting verification"
    );

    let resp = self
      .client
      .post(self.url("/id-verify-base64"))
      .json(&VerifyBody {
        id_card_base64: document.data(),
        selfie_base64:  selfie.data(),
      })
      .send()
      .await
      .map_err(|e| Error::NetworkUnavailable(format!("POST /id-verify-base64 failed: {e}")))?;
    read_json(resp, "/id-verify-base64").await
  }
}

/// Classify a response: non-success status is a server error; a success
/// status whose body does not parse is malformed.
async fn read_json<T>(resp: reqwest::Response, path: &str) -> Result<T>
where
  T: serde::de::DeserializeOwned,
{
  let status = resp.status();
  let body = resp
    .text()
    .await
    .map_err(|e| Error::NetworkUnavailable(format!("reading {path} response: {e}")))?;

  if !status.is_success() {
    return Err(Error::Server {
      status: status.as_u16(),
      body,
    });
  }

  serde_json::from_str(&body).map_err(|e| {
    tracing::warn!(path, error = %e, "backend response does not match the expected shape");
    Error::MalformedResponse(format!("{path}: {e}"))
  })
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
  };
  use serde_json::{Value, json};
  use verid_core::evidence::EncodedPayload;

  use super::*;

  /// Serve `router` on an ephemeral port and return its base URL.
  async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
  }

  fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(BackendConfig::with_base_url(base_url)).unwrap()
  }

  fn payload(data: &str) -> EncodedPayload {
    EncodedPayload::new(data.to_owned(), "image/jpeg", "ab".repeat(32)).unwrap()
  }

  fn request() -> VerificationRequest { VerificationRequest::new(payload("RE9D"), payload("U0VMRg==")) }

  #[test]
  fn invalid_base_url_is_a_configuration_error() {
    let err = HttpBackend::new(BackendConfig::with_base_url("not a url")).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)), "{err}");
    assert_ne!(err.kind(), verid_core::workflow::FailureKind::NetworkUnavailable);
  }

  // ── Probe & health ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn probe_reports_reachable_service() {
    let url = serve(Router::new().route("/", get(|| async { "ok" }))).await;
    assert!(backend(&url).test_connection().await);
  }

  #[tokio::test]
  async fn probe_reports_error_status_as_unreachable() {
    let url = serve(Router::new().route("/", get(|| async { StatusCode::BAD_GATEWAY }))).await;
    assert!(!backend(&url).test_connection().await);
  }

  #[tokio::test]
  async fn probe_reports_closed_port_as_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    assert!(!backend(&format!("http://{addr}")).test_connection().await);
  }

  #[tokio::test]
  async fn health_check_parses_body() {
    let router = Router::new().route(
      "/health",
      get(|| async { Json(json!({ "status": "healthy", "ollama_available": true })) }),
    );
    let url = serve(router).await;
    let health = backend(&url).health_check().await.unwrap();
    assert!(health.is_healthy());
  }

  // ── Submit ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_sends_both_payloads() {
    let router = Router::new().route(
      "/id-verify-base64",
      post(|Json(body): Json<Value>| async move {
        assert_eq!(body["id_card_base64"], "RE9D");
        assert_eq!(body["selfie_base64"], "U0VMRg==");
        Json(json!({
          "verification_id": "20240501_120000",
          "face_verified": true,
          "face_confidence": 0.91,
          "extracted_info": "{\"Name\": \"Ana\"}",
          "status": "success",
          "message": "KYC verification completed",
          "timestamp": "2024-05-01T12:00:00"
        }))
      }),
    );
    let url = serve(router).await;
    let resp = backend(&url).submit(&request()).await.unwrap();
    assert_eq!(resp.verification_id, "20240501_120000");
    assert!(resp.face_verified);
  }

  #[tokio::test]
  async fn incomplete_request_never_reaches_network() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
      "/id-verify-base64",
      post(move || {
        let counter = counter.clone();
        async move {
          counter.fetch_add(1, Ordering::SeqCst);
          StatusCode::OK
        }
      }),
    );
    let url = serve(router).await;
    let client = backend(&url);

    let only_selfie = VerificationRequest {
      document: None,
      selfie:   Some(payload("U0VMRg==")),
    };
    let only_document = VerificationRequest {
      document: Some(payload("RE9D")),
      selfie:   None,
    };
    for req in [only_selfie, only_document] {
      let err = client.submit(&req).await.unwrap_err();
      assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn error_status_is_server_error() {
    let router = Router::new().route(
      "/id-verify-base64",
      post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "KYC verification error: boom") }),
    );
    let url = serve(router).await;
    let err = backend(&url).submit(&request()).await.unwrap_err();
    match err {
      Error::Server { status, body } => {
        assert_eq!(status, 500);
        assert!(body.contains("boom"));
      }
      other => panic!("expected server error, got {other}"),
    }
  }

  #[tokio::test]
  async fn unexpected_body_is_malformed() {
    let router = Router::new().route(
      "/id-verify-base64",
      post(|| async { Json(json!({ "result": "ok" })) }),
    );
    let url = serve(router).await;
    let err = backend(&url).submit(&request()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)), "{err}");
  }

  #[tokio::test]
  async fn unreachable_service_is_network_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = backend(&format!("http://{addr}"))
      .submit(&request())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)), "{err}");
  }
}
