//! Storage-format migration queue.
//!
//! One active slot and one pending slot. Requests that arrive while a
//! conversion runs overwrite the pending slot (last write wins); the pending
//! target is replayed exactly once when the active conversion completes.
//! The queue can also be held, in which case nothing starts until it is
//! released.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageFormat;

/// Identity of one conversion attempt. Completions are matched by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversionId(pub u64);

/// A conversion the queue has decided to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTicket {
    pub id: ConversionId,
    pub from: StorageFormat,
    pub to: StorageFormat,
}

/// What the queue did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDecision {
    /// Nothing was running; the caller must run this conversion.
    Start(ConversionTicket),
    /// A conversion is running; the target now sits in the pending slot.
    /// `replaced` is the previously pending target, now dropped.
    Coalesced { replaced: Option<StorageFormat> },
    /// The queue is held; the target sits in the pending slot.
    Held { replaced: Option<StorageFormat> },
    /// Target equals the current format and nothing is running.
    Unchanged,
}

/// Result of reporting a completion to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub finished: ConversionTicket,
    pub succeeded: bool,
    /// Replay of the pending slot, if any.
    pub next: Option<ConversionTicket>,
}

/// A failed conversion, reported per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("conversion to {target} failed: {cause}")]
pub struct ConversionFailed {
    pub target: StorageFormat,
    pub cause: String,
}

#[derive(Debug, Clone)]
pub struct FormatMigrationQueue {
    current: StorageFormat,
    active: Option<ConversionTicket>,
    pending: Option<StorageFormat>,
    held: bool,
    next_id: u64,
}

impl FormatMigrationQueue {
    pub fn new(current: StorageFormat) -> Self {
        Self {
            current,
            active: None,
            pending: None,
            held: false,
            next_id: 1,
        }
    }

    pub fn current(&self) -> StorageFormat {
        self.current
    }

    pub fn active(&self) -> Option<ConversionTicket> {
        self.active
    }

    pub fn pending(&self) -> Option<StorageFormat> {
        self.pending
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// The format the store will end up in once the queue drains, assuming
    /// every conversion succeeds.
    pub fn eventual_format(&self) -> StorageFormat {
        self.pending
            .or(self.active.map(|ticket| ticket.to))
            .unwrap_or(self.current)
    }

    pub fn request(&mut self, target: StorageFormat) -> QueueDecision {
        if self.held {
            let replaced = self.pending.replace(target);
            return QueueDecision::Held { replaced };
        }

        if self.active.is_some() {
            let replaced = self.pending.replace(target);
            return QueueDecision::Coalesced { replaced };
        }

        if target == self.current {
            return QueueDecision::Unchanged;
        }

        QueueDecision::Start(self.start(target))
    }

    /// Report the end of a conversion.
    ///
    /// Returns `None` when `id` is not the active conversion (stale).
    pub fn complete(&mut self, id: ConversionId, succeeded: bool) -> Option<Completion> {
        let finished = match self.active {
            Some(ticket) if ticket.id == id => ticket,
            _ => return None,
        };

        self.active = None;
        if succeeded {
            self.current = finished.to;
        }

        let next = if self.held { None } else { self.replay_pending() };

        Some(Completion {
            finished,
            succeeded,
            next,
        })
    }

    /// Hold the queue. `target`, if given, overwrites the pending slot.
    pub fn hold(&mut self, target: Option<StorageFormat>) {
        self.held = true;
        if let Some(target) = target {
            self.pending = Some(target);
        }
    }

    /// Release a hold. Returns a conversion to run when the queue is idle
    /// and a pending target differs from the current format.
    pub fn release(&mut self) -> Option<ConversionTicket> {
        self.held = false;
        if self.active.is_some() {
            return None;
        }
        self.replay_pending()
    }

    pub fn discard_pending(&mut self) -> Option<StorageFormat> {
        self.pending.take()
    }

    fn replay_pending(&mut self) -> Option<ConversionTicket> {
        let target = self.pending.take()?;
        if target == self.current {
            return None;
        }
        Some(self.start(target))
    }

    fn start(&mut self, target: StorageFormat) -> ConversionTicket {
        let ticket = ConversionTicket {
            id: ConversionId(self.next_id),
            from: self.current,
            to: target,
        };
        self.next_id += 1;
        self.active = Some(ticket);
        ticket
    }
}
