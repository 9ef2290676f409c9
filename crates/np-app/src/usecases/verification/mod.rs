//! Debounced sync-login verification.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use np_core::{
    ports::{PreferencesEventPort, VerificationClientPort},
    verification::{RequestId, VerificationOutcome, VerificationRequest, VerificationTracker},
    SecretString, VerificationStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub debounce: Duration,
    pub timeout: Duration,
}

pub struct VerificationScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    client: Arc<dyn VerificationClientPort>,
    events: Arc<dyn PreferencesEventPort>,
    policy: VerificationPolicy,
    state: Mutex<SchedulerState>,
}

struct SchedulerState {
    tracker: VerificationTracker,
    task: Option<AbortHandle>,
}

impl VerificationScheduler {
    pub fn new(
        client: Arc<dyn VerificationClientPort>,
        events: Arc<dyn PreferencesEventPort>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                client,
                events,
                policy,
                state: Mutex::new(SchedulerState {
                    tracker: VerificationTracker::new(),
                    task: None,
                }),
            }),
        }
    }

    pub async fn status(&self) -> VerificationStatus {
        self.inner.state.lock().await.tracker.status().clone()
    }

    /// Supersede any pending or running check with a new one that starts
    /// after the debounce delay. Empty fields cancel instead.
    pub async fn schedule(&self, account: &str, secret: SecretString) -> Option<RequestId> {
        let account = account.trim();
        if account.is_empty() || secret.is_empty() {
            debug!("empty sync account or password, cancelling verification");
            self.cancel().await;
            return None;
        }

        let mut state = self.inner.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }

        let (request, changed) = state.tracker.schedule(account.to_string(), secret);
        let id = request.id;
        debug!(request_id = %id, "verification scheduled");
        if let Some(status) = changed {
            self.inner.events.on_verification_status_changed(status).await;
        }

        let inner = Arc::clone(&self.inner);
        let span = info_span!("usecase.verification.run", request_id = %id);
        let handle = tokio::spawn(async move { inner.run(request).await }.instrument(span));
        state.task = Some(handle.abort_handle());
        Some(id)
    }

    pub async fn cancel(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        if let Some(status) = state.tracker.cancel() {
            self.inner.events.on_verification_status_changed(status).await;
        }
        debug!("verification cancelled");
    }
}

impl SchedulerInner {
    async fn run(&self, request: VerificationRequest) {
        tokio::time::sleep(self.policy.debounce).await;

        {
            let mut state = self.state.lock().await;
            let Some(status) = state.tracker.begin_check(request.id) else {
                debug!("verification superseded before it started");
                return;
            };
            self.events.on_verification_status_changed(status).await;
        }

        let outcome = match tokio::time::timeout(
            self.policy.timeout,
            self.client.verify(&request.account, &request.secret),
        )
        .await
        {
            Ok(Ok(true)) => VerificationOutcome::Accepted,
            Ok(Ok(false)) => VerificationOutcome::Rejected,
            Ok(Err(err)) => {
                warn!(error = %err, "login verification failed");
                VerificationOutcome::Failed(err.to_string())
            }
            Err(_elapsed) => {
                warn!(timeout = ?self.policy.timeout, "login verification timed out");
                VerificationOutcome::TimedOut
            }
        };

        let mut state = self.state.lock().await;
        match state.tracker.complete(request.id, outcome) {
            Some(status) => {
                info!(?status, "login verification settled");
                state.task = None;
                self.events.on_verification_status_changed(status).await;
            }
            None => debug!("discarding stale verification result"),
        }
    }
}
