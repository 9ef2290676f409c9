mod context;
mod orchestrator;

pub use context::{CapturedSecret, EncryptionContext};
pub use orchestrator::EncryptionOrchestrator;
