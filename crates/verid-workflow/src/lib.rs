//! The identity-verification workflow: a controller that walks one user from
//! capture to a persisted identity record, and the record store it writes to.
//!
//! The controller is generic over the core traits, so it runs unchanged
//! against the real HTTP backend or the fakes used in tests.

pub mod controller;
pub mod records;

pub use controller::{WorkflowController, WorkflowState};
pub use records::{IdentityRecordStore, Unpersisted};
