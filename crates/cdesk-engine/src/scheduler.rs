//! Deferred resync scheduler
//!
//! Holds at most one pending resync. Scheduling again for the same video
//! coalesces into a single timer that fires no earlier than either request
//! asked for; scheduling for another video replaces the pending one.
//!
//! The scheduler only decides *when* a resync runs. Whether it still applies
//! is checked by the engine at fire time against the loaded video.

use cdesk_gateway::VideoId;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
struct PendingResync {
    video: VideoId,
    generation: u64,
    due: Instant,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Slot {
    next_generation: u64,
    pending: Option<PendingResync>,
}

/// Single-slot timer for deferred resyncs
#[derive(Debug, Clone, Default)]
pub struct ResyncScheduler {
    slot: Arc<Mutex<Slot>>,
}

impl ResyncScheduler {
    /// Create idle scheduler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `resync(video)` once `delay` has elapsed
    ///
    /// Returns the instant the coalesced timer fires. Must be called from
    /// within a tokio runtime.
    pub fn schedule<F, Fut>(&self, video: VideoId, delay: Duration, resync: F) -> Instant
    where
        F: FnOnce(VideoId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock();

        let mut due = Instant::now() + delay;
        if let Some(previous) = slot.pending.take() {
            if previous.video == video && !previous.handle.is_finished() {
                due = due.max(previous.due);
            }
            previous.handle.abort();
        }

        slot.next_generation += 1;
        let generation = slot.next_generation;
        let shared = Arc::clone(&self.slot);
        let target = video.clone();

        let handle = tokio::spawn(async move {
            sleep_until(due).await;
            let still_current = {
                let mut slot = shared.lock();
                let current = slot
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.generation == generation);
                if current {
                    slot.pending = None;
                }
                current
            };
            if still_current {
                resync(target).await;
            }
        });

        tracing::debug!(video_id = %video, delay_ms = ?delay.as_millis(), "resync scheduled");
        slot.pending = Some(PendingResync {
            video,
            generation,
            due,
            handle,
        });
        due
    }

    /// Drop the pending resync, if any
    pub fn cancel(&self) -> Option<VideoId> {
        let pending = self.slot.lock().pending.take()?;
        pending.handle.abort();
        tracing::debug!(video_id = %pending.video, "pending resync cancelled");
        Some(pending.video)
    }

    /// Video of the resync still waiting to fire
    #[must_use]
    pub fn pending_video(&self) -> Option<VideoId> {
        self.slot
            .lock()
            .pending
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.video.clone())
    }
}
