//! Adapters facing the UI layer.

pub mod controller;
pub mod event_channel;

pub use controller::{ControlsState, PrefsController};
pub use event_channel::{ChannelEventPort, PreferencesEvent};
