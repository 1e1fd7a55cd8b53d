//! Core types and trait definitions for the verid identity-verification
//! workflow.
//!
//! No HTTP, filesystem or database code lives here. The I/O seams are the
//! traits in [`backend`] and [`store`]; every other crate implements or
//! consumes them.

pub mod backend;
pub mod error;
pub mod evidence;
pub mod fields;
pub mod record;
pub mod response;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
