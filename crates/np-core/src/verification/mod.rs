//! Sync account verification domain.

pub mod status;
pub mod tracker;

pub use status::{VerificationOutcome, VerificationStatus};
pub use tracker::{RequestId, VerificationPhase, VerificationRequest, VerificationTracker};
