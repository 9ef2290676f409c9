//! Notation preferences application layer
//!
//! This crate drives the pure state machines of `np-core` against the ports
//! and exposes [`PreferencesCoordinator`], the single contract the
//! preferences UI consumes.

pub mod adapters;
pub mod coordinator;
pub mod error;
pub mod policy;
pub mod usecases;

pub use adapters::{ChannelEventPort, PreferencesEvent, PrefsController};
pub use coordinator::{Collaborators, PreferencesCoordinator};
pub use error::CoordinatorError;
pub use policy::CoordinatorPolicy;
