//! Encryption domain module.
//!
//! This module defines the at-rest encryption state machine types.

pub mod error;
pub mod state;
pub mod state_machine;

pub use error::EncryptionError;
pub use state::{
    DisableWarningPolicy, EncryptionMismatch, EncryptionPhase, EncryptionState, MismatchKind,
    MismatchResolution,
};
pub use state_machine::{EncryptionAction, EncryptionEvent, EncryptionStateMachine};
