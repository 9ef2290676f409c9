//! # notation-prefs
//!
//! Composition root for the notation preferences coordinator: loads the
//! TOML config, initializes tracing and wires the platform adapters into a
//! [`np_app::PreferencesCoordinator`].

pub mod bootstrap;

pub use bootstrap::{build_coordinator, init_tracing_subscriber, load_config, HostPorts};
