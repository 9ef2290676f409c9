use serde::{Deserialize, Serialize};

/// Sync account verification status shown next to the account fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No check has run for the current field values.
    #[default]
    Unknown,
    Checking,
    Valid,
    Invalid,
    Error { message: String },
}

impl VerificationStatus {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Valid | VerificationStatus::Invalid | VerificationStatus::Error { .. }
        )
    }

    /// Short text for the status label.
    pub fn label(&self) -> String {
        match self {
            VerificationStatus::Unknown => String::new(),
            VerificationStatus::Checking => "Verifying...".to_string(),
            VerificationStatus::Valid => "Account verified".to_string(),
            VerificationStatus::Invalid => "Incorrect login or password".to_string(),
            VerificationStatus::Error { message } => format!("Could not verify: {message}"),
        }
    }
}

/// Result of one verification call as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted,
    Rejected,
    Failed(String),
    TimedOut,
}

impl From<VerificationOutcome> for VerificationStatus {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Accepted => VerificationStatus::Valid,
            VerificationOutcome::Rejected => VerificationStatus::Invalid,
            VerificationOutcome::Failed(message) => VerificationStatus::Error { message },
            VerificationOutcome::TimedOut => VerificationStatus::Error {
                message: "verification timed out".to_string(),
            },
        }
    }
}
