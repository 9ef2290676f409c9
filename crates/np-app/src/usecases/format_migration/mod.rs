//! Storage-format migration orchestrator.
//!
//! Runs conversions decided by [`FormatMigrationQueue`] as background
//! tasks. One task drains the queue: when a conversion completes and the
//! queue hands back a replay of the pending target, the same task runs it.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{error, info, info_span, warn, Instrument};

use np_core::{
    ports::{DocumentStorePort, FormatConverterPort, PreferencesEventPort},
    storage::{ConversionFailed, ConversionTicket, FormatMigrationQueue, QueueDecision, StorageFormat},
};

pub struct FormatMigrationOrchestrator {
    inner: Arc<MigrationInner>,
}

struct MigrationInner {
    queue: Mutex<FormatMigrationQueue>,
    idle_tx: watch::Sender<bool>,

    converter: Arc<dyn FormatConverterPort>,
    store: Arc<dyn DocumentStorePort>,
    events: Arc<dyn PreferencesEventPort>,
}

impl FormatMigrationOrchestrator {
    pub fn new(
        current: StorageFormat,
        converter: Arc<dyn FormatConverterPort>,
        store: Arc<dyn DocumentStorePort>,
        events: Arc<dyn PreferencesEventPort>,
    ) -> Self {
        let (idle_tx, _idle_rx) = watch::channel(true);
        Self {
            inner: Arc::new(MigrationInner {
                queue: Mutex::new(FormatMigrationQueue::new(current)),
                idle_tx,
                converter,
                store,
                events,
            }),
        }
    }

    /// Copy of the queue for read-only inspection.
    pub async fn snapshot(&self) -> FormatMigrationQueue {
        self.inner.queue.lock().await.clone()
    }

    pub async fn current_format(&self) -> StorageFormat {
        self.inner.queue.lock().await.current()
    }

    pub async fn request_change(&self, target: StorageFormat) -> QueueDecision {
        let mut queue = self.inner.queue.lock().await;
        let decision = queue.request(target);
        match decision {
            QueueDecision::Start(ticket) => {
                info!(from = %ticket.from, to = %ticket.to, id = ticket.id.0, "starting storage format conversion");
                self.inner.idle_tx.send_replace(false);
                self.inner.spawn_drain(ticket);
            }
            QueueDecision::Coalesced { replaced } => {
                info!(%target, replaced = ?replaced, "conversion in flight, format change queued");
            }
            QueueDecision::Held { replaced } => {
                info!(%target, replaced = ?replaced, "migration queue held, format change parked");
            }
            QueueDecision::Unchanged => {
                info!(%target, "storage format unchanged");
            }
        }
        decision
    }

    /// Hold the queue; `target` overwrites the pending slot when given.
    pub async fn hold(&self, target: Option<StorageFormat>) {
        let mut queue = self.inner.queue.lock().await;
        queue.hold(target);
        info!(pending = ?queue.pending(), "migration queue held");
    }

    /// Release a hold and start the parked change, if any.
    pub async fn release(&self) -> Option<ConversionTicket> {
        let mut queue = self.inner.queue.lock().await;
        let next = queue.release();
        if let Some(ticket) = next {
            info!(from = %ticket.from, to = %ticket.to, id = ticket.id.0, "released held format change");
            self.inner.idle_tx.send_replace(false);
            self.inner.spawn_drain(ticket);
        } else {
            info!("migration queue released");
        }
        next
    }

    pub async fn discard_pending(&self) -> Option<StorageFormat> {
        let discarded = self.inner.queue.lock().await.discard_pending();
        if let Some(target) = discarded {
            info!(%target, "discarded pending format change");
        }
        discarded
    }

    /// Resolves once no conversion is running.
    pub async fn wait_until_idle(&self) {
        let mut idle_rx = self.inner.idle_tx.subscribe();
        // The sender lives as long as `self`, so this only ends on idle.
        let _ = idle_rx.wait_for(|idle| *idle).await;
    }
}

impl MigrationInner {
    fn spawn_drain(self: &Arc<Self>, first: ConversionTicket) {
        let inner = Arc::clone(self);
        let span = info_span!("usecase.format_migration.drain", first = %first.to);
        tokio::spawn(
            async move {
                let mut next = Some(first);
                while let Some(ticket) = next {
                    next = inner.run_one(ticket).await;
                }
            }
            .instrument(span),
        );
    }

    /// Run one conversion and report it. Returns the replayed pending
    /// target, if the queue produced one.
    async fn run_one(&self, ticket: ConversionTicket) -> Option<ConversionTicket> {
        // A converted store keeps the new format even when its marker
        // cannot be saved; later conversions start from there.
        let (converted, result) = match self.convert(ticket).await {
            Ok(()) => match self.store.persist_storage_format(ticket.to).await {
                Ok(()) => (true, Ok(())),
                Err(err) => {
                    error!(to = %ticket.to, error = %err, "failed to save storage format marker");
                    (true, Err(format!("converted, but the format marker was not saved: {err:#}")))
                }
            },
            Err(cause) => (false, Err(cause)),
        };

        let mut queue = self.queue.lock().await;
        let Some(completion) = queue.complete(ticket.id, converted) else {
            warn!(id = ticket.id.0, "ignoring completion of a conversion that is not active");
            return None;
        };

        let report = match result {
            Ok(()) => {
                info!(from = %ticket.from, to = %ticket.to, "storage format conversion finished");
                Ok(())
            }
            Err(cause) => {
                error!(from = %ticket.from, to = %ticket.to, %cause, "storage format conversion failed");
                Err(ConversionFailed {
                    target: ticket.to,
                    cause,
                })
            }
        };
        // Reported under the queue lock so results reach observers in
        // completion order.
        self.events.on_format_change_result(ticket.to, report).await;

        if let Some(next) = completion.next {
            info!(from = %next.from, to = %next.to, id = next.id.0, "replaying pending format change");
        } else {
            self.idle_tx.send_replace(queue.is_idle());
        }
        completion.next
    }

    /// The converter runs in its own task so a panic fails the conversion
    /// instead of stopping the drain with the queue still active.
    async fn convert(&self, ticket: ConversionTicket) -> Result<(), String> {
        let converter = Arc::clone(&self.converter);
        let task = tokio::spawn(
            async move { converter.convert(ticket.from, ticket.to).await }.in_current_span(),
        );
        match task.await {
            Ok(res) => res.map_err(|err| err.to_string()),
            Err(err) => {
                error!(to = %ticket.to, error = %err, "format converter task aborted");
                Err(format!("converter task aborted: {err}"))
            }
        }
    }
}
