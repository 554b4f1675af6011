//! Activity log
//!
//! Bounded, in-memory record of engine actions for diagnostics. Oldest
//! entries are dropped once capacity is reached.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use ulid::Ulid;

/// Kind of recorded action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Threads listed for a video
    ThreadsLoaded,
    /// Listing reported comments disabled
    CommentsDisabled,
    /// Listing failed
    LoadFailed,
    /// Listing result arrived after a video switch
    StaleListingDiscarded,
    /// Top-level comment confirmed
    CommentPosted,
    /// Reply confirmed
    ReplyPosted,
    /// Deletion confirmed
    CommentDeleted,
    /// Remote write failed
    WriteFailed,
    /// Local change undone
    RolledBack,
    /// Undo skipped because the store moved on while the write was in flight
    RollbackSkipped,
    /// Deferred resync ran
    ResyncCompleted,
    /// Deferred resync fired after a video switch and was dropped
    StaleResyncDiscarded,
}

/// One recorded action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Event id, sortable by creation time
    pub id: Ulid,
    /// Wall-clock time
    pub at: DateTime<Utc>,
    /// What happened
    pub event: ActivityKind,
    /// Free-form details
    pub details: Value,
}

/// Bounded activity log
#[derive(Debug)]
pub struct ActivityLog {
    inner: Mutex<VecDeque<ActivityEvent>>,
    capacity: usize,
}

impl ActivityLog {
    /// Create log keeping at most `capacity` events
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Record an event
    pub fn record(&self, kind: ActivityKind, details: Value) -> Ulid {
        let event = ActivityEvent {
            id: Ulid::new(),
            at: Utc::now(),
            event: kind,
            details,
        };
        let id = event.id;
        tracing::debug!(?kind, details = %event.details, "activity");

        let mut guard = self.inner.lock();
        if guard.len() == self.capacity {
            guard.pop_front();
        }
        guard.push_back(event);
        id
    }

    /// All retained events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.inner.lock().iter().cloned().collect()
    }
}
