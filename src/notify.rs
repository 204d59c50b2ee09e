//! Transient user notifications ("toasts").
//!
//! Components receive an `Arc<dyn Notifier>` instead of reaching for a global.
//! Interactive sessions use [`Queue`], headless contexts use [`Silent`].

use super::Timestamp;
use chrono::prelude::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

/// How long a notification stays on screen, in milliseconds
pub const DISPLAY_MILLIS: i64 = 5000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Info,
    Success,
    Error,
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Info => "info",
            Kind::Success => "success",
            Kind::Error => "error",
        }
    }
}

pub trait Notifier: Send + Sync {
    fn open(&self, kind: Kind, message: &str);

    fn info(&self, message: &str) {
        self.open(Kind::Info, message)
    }

    fn success(&self, message: &str) {
        self.open(Kind::Success, message)
    }

    fn error(&self, message: &str) {
        self.open(Kind::Error, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub kind: Kind,
    pub message: String,
    pub created: Timestamp,
}

impl Notification {
    pub fn expired(&self, now: Timestamp) -> bool {
        now - self.created >= chrono::Duration::milliseconds(DISPLAY_MILLIS)
    }
}

/// In-memory queue of notifications for the lifetime of the session.
#[derive(Debug, Default)]
pub struct Queue {
    entries: Mutex<VecDeque<Notification>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Unexpired notifications, oldest first. Expired ones are forgotten.
    pub fn visible(&self, now: Timestamp) -> Vec<Notification> {
        let mut entries = self.entries();
        entries.retain(|n| !n.expired(now));
        entries.iter().cloned().collect()
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.entries().drain(..).collect()
    }
}

impl Notifier for Queue {
    fn open(&self, kind: Kind, message: &str) {
        match kind {
            Kind::Error => error!("[{}] {}", kind.label(), message),
            _ => info!("[{}] {}", kind.label(), message),
        }
        self.entries().push_back(Notification {
            kind,
            message: message.to_string(),
            created: Utc::now(),
        });
    }
}

/// Discards everything. Used where nobody is watching.
#[derive(Copy, Clone, Debug, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn open(&self, _kind: Kind, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_keeps_order_and_kind() {
        let queue = Queue::new();
        queue.info("Updating device data...");
        queue.success("Settings updated!");
        queue.error("error: boom");

        let drained = queue.drain();
        let kinds: Vec<Kind> = drained.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![Kind::Info, Kind::Success, Kind::Error]);
        assert_eq!(drained[2].message, "error: boom");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_visible_forgets_expired_entries() {
        let queue = Queue::new();
        queue.open(Kind::Info, "Retrieving latest config...");
        let created = queue.visible(Utc::now())[0].created;

        let just_before = created + chrono::Duration::milliseconds(DISPLAY_MILLIS - 1);
        assert_eq!(queue.visible(just_before).len(), 1);

        let after = created + chrono::Duration::milliseconds(DISPLAY_MILLIS);
        assert!(queue.visible(after).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_silent_through_trait_object() {
        let notifier: &dyn Notifier = &Silent;
        notifier.info("nobody hears this");
        notifier.error("nor this");
    }
}
