//! Production implementations of the verid I/O seams: a file-backed
//! [`PayloadEncoder`](verid_core::backend::PayloadEncoder) and an HTTP
//! [`VerificationBackend`](verid_core::backend::VerificationBackend).

pub mod config;
pub mod encode;
pub mod http;

pub use config::BackendConfig;
pub use encode::FileEncoder;
pub use http::HttpBackend;
