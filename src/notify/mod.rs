use std::collections::VecDeque;
use std::time::Instant;

use tracing::debug;
use uuid::Uuid;

use crate::config::NotifyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Transient alert raised by any part of the client. Self-destructs on
/// timeout or when evicted to make room.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// Bounded FIFO of live notifications. Two independent removal paths:
/// eviction when full (oldest first) and per-entry expiry; removing an
/// entry that is already gone is a no-op.
///
/// Repeated identical messages enqueue repeatedly; no de-duplication
/// policy exists upstream.
#[derive(Debug)]
pub struct NotificationQueue {
    config: NotifyConfig,
    entries: VecDeque<Notification>,
}

impl NotificationQueue {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            entries: VecDeque::new(),
        }
    }

    pub fn enqueue(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: Instant,
    ) -> Uuid {
        while self.entries.len() >= self.config.capacity {
            match self.entries.pop_front() {
                Some(evicted) => debug!(id = %evicted.id, "notification evicted"),
                None => break,
            }
        }

        let note = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: now,
            expires_at: now + self.config.lifetime,
        };
        let id = note.id;
        self.entries.push_back(note);
        id
    }

    /// Drop every entry whose lifetime has elapsed. Returns how many were
    /// removed so the runtime knows whether the list changed.
    pub fn expire_due(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|n| n.expires_at > now);
        before - self.entries.len()
    }

    /// Idempotent removal by id (entry may already have expired or been
    /// evicted).
    pub fn remove(&mut self, id: Uuid) {
        self.entries.retain(|n| n.id != id);
    }

    /// Earliest expiry among live entries, for the runtime's timer.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries.iter().map(|n| n.expires_at).min()
    }

    pub fn live(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
