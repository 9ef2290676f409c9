pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::load_config;
pub use self::tracing::{default_log_dir, init_tracing_subscriber};
pub use wiring::{build_coordinator, HostPorts, WiringError};
