//! Verification request bookkeeping.
//!
//! Every scheduled check gets a fresh, monotonic [`RequestId`]. Only the
//! latest id may move the status; anything else is a stale result and is
//! dropped. Cancelling forgets the latest id, so late results of a
//! cancelled request are stale as well.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::security::SecretString;
use crate::verification::{VerificationOutcome, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One login check, owned by the task that performs it.
#[derive(Debug)]
pub struct VerificationRequest {
    pub id: RequestId,
    pub account: String,
    pub secret: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationPhase {
    Idle,
    Debouncing(RequestId),
    Checking(RequestId),
    Settled(VerificationStatus),
}

#[derive(Debug)]
pub struct VerificationTracker {
    next_id: u64,
    phase: VerificationPhase,
    status: VerificationStatus,
}

impl Default for VerificationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationTracker {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            phase: VerificationPhase::Idle,
            status: VerificationStatus::Unknown,
        }
    }

    pub fn phase(&self) -> &VerificationPhase {
        &self.phase
    }

    pub fn status(&self) -> &VerificationStatus {
        &self.status
    }

    pub fn latest(&self) -> Option<RequestId> {
        match self.phase {
            VerificationPhase::Debouncing(id) | VerificationPhase::Checking(id) => Some(id),
            VerificationPhase::Idle | VerificationPhase::Settled(_) => None,
        }
    }

    /// Supersede whatever is running with a new request in the debounce
    /// phase. Returns the new status when it changed.
    pub fn schedule(
        &mut self,
        account: String,
        secret: SecretString,
    ) -> (VerificationRequest, Option<VerificationStatus>) {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.phase = VerificationPhase::Debouncing(id);
        let changed = self.set_status(VerificationStatus::Unknown);
        (VerificationRequest { id, account, secret }, changed)
    }

    /// The debounce delay of `id` elapsed. Returns `None` when `id` was
    /// superseded or cancelled and the call must not be made.
    pub fn begin_check(&mut self, id: RequestId) -> Option<VerificationStatus> {
        if self.phase != VerificationPhase::Debouncing(id) {
            return None;
        }
        self.phase = VerificationPhase::Checking(id);
        self.set_status(VerificationStatus::Checking);
        Some(VerificationStatus::Checking)
    }

    /// The call for `id` returned. Returns the settled status, or `None`
    /// when the result is stale.
    pub fn complete(
        &mut self,
        id: RequestId,
        outcome: VerificationOutcome,
    ) -> Option<VerificationStatus> {
        if self.phase != VerificationPhase::Checking(id) {
            return None;
        }
        let status = VerificationStatus::from(outcome);
        self.phase = VerificationPhase::Settled(status.clone());
        self.set_status(status.clone());
        Some(status)
    }

    /// Drop any pending or in-flight request. Returns the new status when it
    /// changed.
    pub fn cancel(&mut self) -> Option<VerificationStatus> {
        self.phase = VerificationPhase::Idle;
        self.set_status(VerificationStatus::Unknown)
    }

    fn set_status(&mut self, status: VerificationStatus) -> Option<VerificationStatus> {
        if self.status == status {
            return None;
        }
        self.status = status.clone();
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(tracker: &mut VerificationTracker) -> RequestId {
        let (request, _) = tracker.schedule("me@example.com".into(), SecretString::from("pw"));
        request.id
    }

    #[test]
    fn ids_are_monotonic() {
        let mut tracker = VerificationTracker::new();
        let a = schedule(&mut tracker);
        let b = schedule(&mut tracker);
        assert!(b > a);
    }

    #[test]
    fn full_cycle_settles_status() {
        let mut tracker = VerificationTracker::new();
        let id = schedule(&mut tracker);
        assert_eq!(tracker.begin_check(id), Some(VerificationStatus::Checking));
        assert_eq!(
            tracker.complete(id, VerificationOutcome::Accepted),
            Some(VerificationStatus::Valid)
        );
        assert_eq!(
            tracker.phase(),
            &VerificationPhase::Settled(VerificationStatus::Valid)
        );
    }

    #[test]
    fn superseded_request_never_starts_or_settles() {
        let mut tracker = VerificationTracker::new();
        let first = schedule(&mut tracker);
        let second = schedule(&mut tracker);

        assert_eq!(tracker.begin_check(first), None);
        assert!(tracker.begin_check(second).is_some());
        assert_eq!(tracker.complete(first, VerificationOutcome::Accepted), None);
        assert_eq!(
            tracker.complete(second, VerificationOutcome::Rejected),
            Some(VerificationStatus::Invalid)
        );
    }

    #[test]
    fn stale_result_after_newer_check_started_is_dropped() {
        let mut tracker = VerificationTracker::new();
        let first = schedule(&mut tracker);
        tracker.begin_check(first);
        let second = schedule(&mut tracker);

        assert_eq!(tracker.complete(first, VerificationOutcome::Accepted), None);
        assert_eq!(tracker.status(), &VerificationStatus::Unknown);
        assert_eq!(tracker.latest(), Some(second));
    }

    #[test]
    fn cancel_reverts_to_unknown_and_drops_late_result() {
        let mut tracker = VerificationTracker::new();
        let id = schedule(&mut tracker);
        tracker.begin_check(id);

        assert_eq!(tracker.cancel(), Some(VerificationStatus::Unknown));
        assert_eq!(tracker.phase(), &VerificationPhase::Idle);
        assert_eq!(tracker.complete(id, VerificationOutcome::Accepted), None);
        assert_eq!(tracker.status(), &VerificationStatus::Unknown);
    }

    #[test]
    fn rescheduling_after_valid_reports_unknown_once() {
        let mut tracker = VerificationTracker::new();
        let id = schedule(&mut tracker);
        tracker.begin_check(id);
        tracker.complete(id, VerificationOutcome::Accepted);

        let (_, changed) = tracker.schedule("me@example.com".into(), SecretString::from("pw2"));
        assert_eq!(changed, Some(VerificationStatus::Unknown));
        let (_, changed) = tracker.schedule("me@example.com".into(), SecretString::from("pw3"));
        assert_eq!(changed, None);
    }

    #[test]
    fn timeout_maps_to_error_status() {
        let mut tracker = VerificationTracker::new();
        let id = schedule(&mut tracker);
        tracker.begin_check(id);
        let status = tracker
            .complete(id, VerificationOutcome::TimedOut)
            .expect("settled");
        assert!(matches!(status, VerificationStatus::Error { .. }));
    }
}
