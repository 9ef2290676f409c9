//! Runtime policy derived from [`CoordinatorConfig`].
//!
//! The config DTO carries raw facts; defaults and fallbacks are applied
//! here.

use std::time::Duration;

use tracing::warn;

use np_core::{encryption::DisableWarningPolicy, CoordinatorConfig};

use crate::usecases::VerificationPolicy;

pub const DEFAULT_PASSPHRASE_ACCOUNT: &str = "notes-passphrase";
pub const DEFAULT_VERIFICATION_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorPolicy {
    pub passphrase_account: String,
    pub disable_warning: DisableWarningPolicy,
    pub verification: VerificationPolicy,
}

impl Default for CoordinatorPolicy {
    fn default() -> Self {
        Self {
            passphrase_account: DEFAULT_PASSPHRASE_ACCOUNT.to_string(),
            disable_warning: DisableWarningPolicy::Always,
            verification: VerificationPolicy {
                debounce: DEFAULT_VERIFICATION_DEBOUNCE,
                timeout: DEFAULT_VERIFICATION_TIMEOUT,
            },
        }
    }
}

impl CoordinatorPolicy {
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        let defaults = Self::default();

        let passphrase_account = if config.passphrase_account.trim().is_empty() {
            defaults.passphrase_account
        } else {
            config.passphrase_account.trim().to_string()
        };

        let disable_warning = if config.disable_warning.trim().is_empty() {
            defaults.disable_warning
        } else {
            DisableWarningPolicy::parse(&config.disable_warning).unwrap_or_else(|| {
                warn!(
                    value = %config.disable_warning,
                    "unknown disable_warning policy, falling back to always"
                );
                DisableWarningPolicy::Always
            })
        };

        let debounce = match config.verification_debounce_ms {
            0 => defaults.verification.debounce,
            ms => Duration::from_millis(ms),
        };
        let timeout = match config.verification_timeout_secs {
            0 => defaults.verification.timeout,
            secs => Duration::from_secs(secs),
        };

        Self {
            passphrase_account,
            disable_warning,
            verification: VerificationPolicy { debounce, timeout },
        }
    }
}
