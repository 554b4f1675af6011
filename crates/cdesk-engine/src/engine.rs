//! Reconciliation engine
//!
//! Every write follows the same sequence:
//! 1. Validate against the session and the loaded video
//! 2. Apply the change to the store optimistically (provisional ids)
//! 3. Issue exactly one remote call
//! 4. On success, notify and schedule a deferred full resync
//! 5. On failure, notify and undo (snapshot restore, or a full resync for replies)
//!
//! Engine state sits behind a synchronous lock that is released before every
//! `.await`, so each store mutation is a single atomic step and the optimistic
//! change is visible before the remote call goes out.

use crate::activity::{ActivityEvent, ActivityKind, ActivityLog};
use crate::config::EngineConfig;
use crate::drafts::Drafts;
use crate::error::{EngineError, ValidationError};
use crate::notify::{Notice, Notifier};
use crate::scheduler::ResyncScheduler;
use crate::session::Session;
use cdesk_gateway::{CommentGateway, GatewayError, Listing, VideoId};
use cdesk_store::{Comment, CommentId, StoreSnapshot, Thread, ThreadStore};
use chrono::Utc;
use im::Vector;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Kind of remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// New top-level comment
    Post,
    /// Reply to a thread
    Reply,
    /// Delete a thread root or reply
    Delete,
}

impl WriteAction {
    /// Notice text on success
    #[must_use]
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Post => "Comment posted!",
            Self::Reply => "Reply posted!",
            Self::Delete => "Comment deleted",
        }
    }

    /// Notice text on failure
    #[must_use]
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Post => "Failed to post comment",
            Self::Reply => "Failed to reply",
            Self::Delete => "Failed to delete comment",
        }
    }

    fn confirmed_kind(self) -> ActivityKind {
        match self {
            Self::Post => ActivityKind::CommentPosted,
            Self::Reply => ActivityKind::ReplyPosted,
            Self::Delete => ActivityKind::CommentDeleted,
        }
    }
}

impl std::fmt::Display for WriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Post => "post",
            Self::Reply => "reply",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of an accepted write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Remote write succeeded; carries the provisional id (post, reply) or
    /// the deleted id
    Applied(CommentId),
    /// Comments are disabled for the loaded video; nothing happened
    Suppressed,
}

impl WriteOutcome {
    /// Id touched by the write, if it was applied
    #[must_use]
    pub fn applied_id(&self) -> Option<&CommentId> {
        match self {
            Self::Applied(id) => Some(id),
            Self::Suppressed => None,
        }
    }
}

/// Result of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Store replaced with the listed threads
    Loaded {
        /// Number of threads listed
        threads: usize,
    },
    /// Video has comments turned off; store cleared
    CommentsDisabled,
    /// Another video was loaded before the listing returned
    Discarded,
}

#[derive(Debug, Default)]
struct EngineState {
    store: ThreadStore,
    loaded_video: Option<VideoId>,
    /// Bumped on every video switch; a return to an earlier video is a new load
    generation: u64,
    /// Bumped whenever the store is replaced wholesale
    epoch: u64,
    comments_disabled: bool,
    in_flight_listings: usize,
    drafts: Drafts,
}

/// Store state an optimistic write was applied to
#[derive(Debug)]
struct WriteBase {
    video: VideoId,
    generation: u64,
    epoch: u64,
    snapshot: StoreSnapshot,
}

impl EngineState {
    fn is_loaded(&self, video: &VideoId) -> bool {
        self.loaded_video.as_ref() == Some(video)
    }

    fn is_current(&self, video: &VideoId, generation: u64) -> bool {
        self.is_loaded(video) && self.generation == generation
    }

    fn write_base(&self, video: VideoId) -> WriteBase {
        WriteBase {
            video,
            generation: self.generation,
            epoch: self.epoch,
            snapshot: self.store.snapshot(),
        }
    }

    /// Why `base` must not be restored, if it must not
    fn rollback_blocker(&self, base: &WriteBase) -> Option<&'static str> {
        if !self.is_current(&base.video, base.generation) {
            Some("video switched")
        } else if self.comments_disabled {
            Some("comments disabled")
        } else if self.epoch != base.epoch {
            Some("store relisted")
        } else {
            None
        }
    }

    fn check_session(&self, session: &Session) -> Result<VideoId, ValidationError> {
        if !session.identity.authenticated {
            return Err(ValidationError::NotAuthenticated);
        }
        let video = session.video_id.as_ref().ok_or(ValidationError::NoVideoLoaded)?;
        if !self.is_loaded(video) {
            return Err(ValidationError::VideoNotLoaded(video.clone()));
        }
        Ok(video.clone())
    }
}

struct Inner {
    gateway: Arc<dyn CommentGateway>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    state: RwLock<EngineState>,
    scheduler: ResyncScheduler,
    activity: ActivityLog,
}

/// Owner of the thread store for the loaded video
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ReconciliationEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ReconciliationEngine")
            .field("loaded_video", &state.loaded_video)
            .field("threads", &state.store.len())
            .field("comments_disabled", &state.comments_disabled)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    /// Create engine with no video loaded
    #[must_use]
    pub fn new(
        gateway: impl CommentGateway + 'static,
        notifier: impl Notifier + 'static,
        config: EngineConfig,
    ) -> Self {
        let activity = ActivityLog::new(config.activity_capacity);
        Self {
            inner: Arc::new(Inner {
                gateway: Arc::new(gateway),
                notifier: Arc::new(notifier),
                config,
                state: RwLock::new(EngineState::default()),
                scheduler: ResyncScheduler::new(),
                activity,
            }),
        }
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// Switch to (or refresh) a video and run a full resync
    ///
    /// Switching clears the store, the disabled flag and all drafts, and
    /// cancels any pending deferred resync.
    ///
    /// # Errors
    /// - `ValidationError::NotAuthenticated` if the session is signed out
    /// - `EngineError::Fetch` if the listing fails; the store is kept
    pub async fn load_threads_for_video(
        &self,
        session: &Session,
        video_id: VideoId,
    ) -> Result<LoadOutcome, EngineError> {
        if !session.identity.authenticated {
            return Err(ValidationError::NotAuthenticated.into());
        }

        let (switched, generation) = {
            let mut state = self.inner.state.write();
            let switched = !state.is_loaded(&video_id);
            if switched {
                state.store.clear();
                state.comments_disabled = false;
                state.drafts.reset();
                state.in_flight_listings = 0;
                state.generation += 1;
                state.epoch += 1;
                state.loaded_video = Some(video_id.clone());
            }
            state.in_flight_listings += 1;
            (switched, state.generation)
        };
        if switched {
            self.inner.scheduler.cancel();
            tracing::info!(video_id = %video_id, generation, "video loaded");
        }

        let result = self.inner.gateway.list_threads(&video_id).await;
        self.apply_listing(&video_id, generation, result)
    }

    /// Install a listing result if the load it belongs to is still current
    fn apply_listing(
        &self,
        video: &VideoId,
        generation: u64,
        result: Result<Listing, GatewayError>,
    ) -> Result<LoadOutcome, EngineError> {
        let mut state = self.inner.state.write();
        if !state.is_current(video, generation) {
            drop(state);
            tracing::debug!(video_id = %video, generation, "stale listing discarded");
            self.record(
                ActivityKind::StaleListingDiscarded,
                json!({ "video_id": video, "generation": generation }),
            );
            return Ok(LoadOutcome::Discarded);
        }
        state.in_flight_listings = state.in_flight_listings.saturating_sub(1);

        match result {
            Ok(Listing::Threads(threads)) => {
                let count = threads.len();
                state.store.replace_all(threads);
                state.epoch += 1;
                let replies = state.store.reply_count_total();
                let was_disabled = std::mem::replace(&mut state.comments_disabled, false);
                drop(state);

                tracing::debug!(video_id = %video, threads = count, replies, "threads listed");
                if was_disabled {
                    tracing::info!(video_id = %video, "comments re-enabled");
                }
                self.record(
                    ActivityKind::ThreadsLoaded,
                    json!({ "video_id": video, "threads": count, "replies": replies }),
                );
                Ok(LoadOutcome::Loaded { threads: count })
            }
            Ok(Listing::CommentsDisabled) => {
                state.store.clear();
                state.epoch += 1;
                let newly_disabled = !std::mem::replace(&mut state.comments_disabled, true);
                drop(state);

                if newly_disabled {
                    tracing::info!(video_id = %video, "comments disabled");
                    self.record(ActivityKind::CommentsDisabled, json!({ "video_id": video }));
                }
                Ok(LoadOutcome::CommentsDisabled)
            }
            Err(err) => {
                drop(state);
                tracing::warn!(video_id = %video, error = %err, "listing failed");
                self.record(
                    ActivityKind::LoadFailed,
                    json!({ "video_id": video, "error": err.to_string() }),
                );
                Err(EngineError::Fetch(err))
            }
        }
    }

    /// Full resync for `video`; `None` if another video is loaded
    async fn resync(&self, video: &VideoId) -> Option<Result<LoadOutcome, EngineError>> {
        let generation = {
            let mut state = self.inner.state.write();
            if !state.is_loaded(video) {
                return None;
            }
            state.in_flight_listings += 1;
            state.generation
        };
        let result = self.inner.gateway.list_threads(video).await;
        Some(self.apply_listing(video, generation, result))
    }

    fn schedule_resync(&self, video: VideoId, delay: Duration) {
        if !self.inner.state.read().is_loaded(&video) {
            tracing::debug!(video_id = %video, "video switched during write; resync dropped");
            self.record(ActivityKind::StaleResyncDiscarded, json!({ "video_id": video }));
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.scheduler.schedule(video, delay, move |video| async move {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.run_deferred_resync(video).await;
            }
        });
    }

    async fn run_deferred_resync(&self, video: VideoId) {
        match self.resync(&video).await {
            None => {
                tracing::debug!(video_id = %video, "stale resync discarded");
                self.record(ActivityKind::StaleResyncDiscarded, json!({ "video_id": video }));
            }
            Some(Ok(outcome)) => {
                tracing::debug!(video_id = %video, ?outcome, "deferred resync completed");
                self.record(ActivityKind::ResyncCompleted, json!({ "video_id": video }));
            }
            Some(Err(err)) => {
                tracing::warn!(video_id = %video, error = %err, "deferred resync failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Post a new top-level comment on the loaded video
    ///
    /// The provisional thread is inserted at the front before the remote call.
    ///
    /// # Errors
    /// - `EngineError::Validation` for blank text or a bad session
    /// - `EngineError::RemoteWrite` if the remote call failed (rolled back)
    pub async fn post_top_level_comment(
        &self,
        session: &Session,
        body: &str,
    ) -> Result<WriteOutcome, EngineError> {
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody.into());
        }

        let (base, id) = {
            let mut state = self.inner.state.write();
            let video = state.check_session(session)?;
            if state.comments_disabled {
                tracing::debug!(video_id = %video, "post suppressed: comments disabled");
                return Ok(WriteOutcome::Suppressed);
            }
            let base = state.write_base(video);
            let id = state.store.fresh_provisional_id();
            let comment = Comment::new(id.clone(), session.identity.author(), body, Utc::now());
            state.store.insert_thread_at_front(Thread::new(comment));
            state.drafts.clear_new_comment();
            (base, id)
        };
        tracing::info!(video_id = %base.video, comment_id = %id, "posting comment");

        let result = self
            .inner
            .gateway
            .post_top_level_comment(&base.video, body)
            .await;
        self.finish_write(WriteAction::Post, base, id, result).await
    }

    /// Reply to a thread
    ///
    /// `thread_id` may name the thread or its root comment. The provisional
    /// reply is appended and the thread's reply draft cleared before the
    /// remote call.
    ///
    /// # Errors
    /// - `EngineError::Validation` for blank text, a bad session, an unknown
    ///   thread, or a thread that is itself still provisional
    /// - `EngineError::RemoteWrite` if the remote call failed (store resynced)
    pub async fn reply_to_thread(
        &self,
        session: &Session,
        thread_id: &CommentId,
        body: &str,
    ) -> Result<WriteOutcome, EngineError> {
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody.into());
        }

        let (base, parent_id, id) = {
            let mut state = self.inner.state.write();
            let video = state.check_session(session)?;
            if state.comments_disabled {
                tracing::debug!(video_id = %video, "reply suppressed: comments disabled");
                return Ok(WriteOutcome::Suppressed);
            }
            let thread = state
                .store
                .threads()
                .iter()
                .find(|t| t.is_addressed_by(thread_id))
                .ok_or_else(|| ValidationError::ThreadNotFound(thread_id.clone()))?;
            let parent_id = thread
                .top_level
                .id
                .as_confirmed()
                .ok_or_else(|| ValidationError::PendingTarget(thread_id.clone()))?
                .to_owned();
            let store_thread_id = thread.id.clone();

            let base = state.write_base(video);
            let id = state.store.fresh_provisional_id();
            let reply = Comment::new(id.clone(), session.identity.author(), body, Utc::now());
            state.store.append_reply_to_thread(&store_thread_id, reply);
            state.drafts.clear_reply(thread_id);
            if store_thread_id != *thread_id {
                state.drafts.clear_reply(&store_thread_id);
            }
            (base, parent_id, id)
        };
        tracing::info!(video_id = %base.video, parent_id = %parent_id, comment_id = %id, "posting reply");

        let result = self.inner.gateway.post_reply(&parent_id, body).await;
        self.finish_write(WriteAction::Reply, base, id, result).await
    }

    /// Delete a thread root or a reply
    ///
    /// A thread root id (or thread id) removes the whole thread; a reply id
    /// removes only that reply. A confirmed id missing from the store is
    /// still deleted remotely.
    ///
    /// # Errors
    /// - `EngineError::Validation` for a bad session or a provisional id
    /// - `EngineError::RemoteWrite` if the remote call failed (rolled back)
    pub async fn delete_comment(
        &self,
        session: &Session,
        id: &CommentId,
    ) -> Result<WriteOutcome, EngineError> {
        let (base, remote_id) = {
            let mut state = self.inner.state.write();
            let video = state.check_session(session)?;
            if state.comments_disabled {
                tracing::debug!(video_id = %video, "delete suppressed: comments disabled");
                return Ok(WriteOutcome::Suppressed);
            }
            let remote_id = id
                .as_confirmed()
                .ok_or_else(|| ValidationError::PendingTarget(id.clone()))?
                .to_owned();

            let base = state.write_base(video);
            if state.store.remove_by_id(id).is_none() {
                tracing::debug!(comment_id = %id, "delete target not in store");
            }
            (base, remote_id)
        };
        tracing::info!(video_id = %base.video, comment_id = %id, "deleting comment");

        let result = self.inner.gateway.delete_by_id(&remote_id).await;
        self.finish_write(WriteAction::Delete, base, id.clone(), result)
            .await
    }

    async fn finish_write(
        &self,
        action: WriteAction,
        base: WriteBase,
        id: CommentId,
        result: Result<(), GatewayError>,
    ) -> Result<WriteOutcome, EngineError> {
        match result {
            Ok(()) => {
                let video = base.video;
                tracing::info!(video_id = %video, comment_id = %id, %action, "remote write confirmed");
                self.inner
                    .notifier
                    .notify(Notice::success(action.success_message()));
                self.record(
                    action.confirmed_kind(),
                    json!({ "video_id": video, "comment_id": id.to_string() }),
                );
                let delay = match action {
                    WriteAction::Delete => self.inner.config.delete_resync_delay(),
                    WriteAction::Post | WriteAction::Reply => self.inner.config.resync_delay(),
                };
                self.schedule_resync(video, delay);
                Ok(WriteOutcome::Applied(id))
            }
            Err(source) => {
                let video = &base.video;
                let retryable = source.is_retryable();
                tracing::warn!(video_id = %video, comment_id = %id, %action, retryable, error = %source, "remote write failed");
                self.inner
                    .notifier
                    .notify(Notice::error(action.failure_message()));
                self.record(
                    ActivityKind::WriteFailed,
                    json!({
                        "video_id": video,
                        "comment_id": id.to_string(),
                        "action": action,
                        "error": source.to_string(),
                        "retryable": retryable,
                    }),
                );
                match action {
                    WriteAction::Reply => self.recover_failed_reply(base).await,
                    WriteAction::Post | WriteAction::Delete => self.rollback(base),
                }
                Err(EngineError::RemoteWrite { action, source })
            }
        }
    }

    /// Restore the snapshot in `base` unless the store has moved on since
    ///
    /// A video switch, a comments-disabled listing, or any listing installed
    /// while the write was in flight leaves the store as it is.
    fn rollback(&self, base: WriteBase) {
        let blocker = {
            let mut state = self.inner.state.write();
            let blocker = state.rollback_blocker(&base);
            if blocker.is_none() {
                state.store.restore(base.snapshot);
            }
            blocker
        };
        let video = &base.video;
        match blocker {
            None => {
                tracing::debug!(video_id = %video, "store restored from snapshot");
                self.record(
                    ActivityKind::RolledBack,
                    json!({ "video_id": video, "strategy": "snapshot" }),
                );
            }
            Some(reason) => {
                tracing::debug!(video_id = %video, reason, "rollback skipped");
                self.record(
                    ActivityKind::RollbackSkipped,
                    json!({ "video_id": video, "reason": reason }),
                );
            }
        }
    }

    /// Refetch after a failed reply; restore the snapshot if that fails too
    async fn recover_failed_reply(&self, base: WriteBase) {
        if !self.inner.state.read().is_current(&base.video, base.generation) {
            self.rollback(base);
            return;
        }
        let video = base.video.clone();
        match self.resync(&video).await {
            None | Some(Ok(LoadOutcome::Discarded)) => {
                tracing::debug!(video_id = %video, "video switched; reply recovery skipped");
            }
            Some(Ok(_)) => {
                self.record(
                    ActivityKind::RolledBack,
                    json!({ "video_id": video, "strategy": "resync" }),
                );
            }
            Some(Err(err)) => {
                tracing::warn!(video_id = %video, error = %err, "resync after failed reply failed");
                self.rollback(base);
            }
        }
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Buffer reply text for a thread
    pub fn set_reply_draft(&self, thread_id: CommentId, text: impl Into<String>) {
        self.inner.state.write().drafts.set_reply(thread_id, text);
    }

    /// Buffered reply text for a thread
    #[must_use]
    pub fn reply_draft(&self, thread_id: &CommentId) -> String {
        self.inner.state.read().drafts.reply(thread_id).to_owned()
    }

    /// Open the reply box on a thread, or close it if already open there
    pub fn toggle_reply_target(&self, thread_id: CommentId) -> Option<CommentId> {
        self.inner
            .state
            .write()
            .drafts
            .toggle_reply_target(thread_id)
            .cloned()
    }

    /// Thread whose reply box is open
    #[must_use]
    pub fn active_reply_target(&self) -> Option<CommentId> {
        self.inner.state.read().drafts.reply_target().cloned()
    }

    /// Open the reply box on `thread_id` addressed to the author of `reply_id`
    ///
    /// The draft is pre-filled with `@<author> `.
    ///
    /// # Errors
    /// `ThreadNotFound` or `CommentNotFound` if either is not in the store
    pub fn begin_reply_to_reply(
        &self,
        thread_id: &CommentId,
        reply_id: &CommentId,
    ) -> Result<(), ValidationError> {
        let mut state = self.inner.state.write();
        let author = {
            let thread = state
                .store
                .thread(thread_id)
                .ok_or_else(|| ValidationError::ThreadNotFound(thread_id.clone()))?;
            let reply = thread
                .reply(reply_id)
                .ok_or_else(|| ValidationError::CommentNotFound(reply_id.clone()))?;
            reply.author.display_name.clone()
        };
        state.drafts.begin_reply_to(thread_id.clone(), &author);
        Ok(())
    }

    /// Reply to a thread with its buffered draft
    ///
    /// # Errors
    /// As [`reply_to_thread`](Self::reply_to_thread)
    pub async fn reply_from_draft(
        &self,
        session: &Session,
        thread_id: &CommentId,
    ) -> Result<WriteOutcome, EngineError> {
        let body = self.reply_draft(thread_id);
        self.reply_to_thread(session, thread_id, &body).await
    }

    /// Buffer new top-level comment text
    pub fn set_new_comment_draft(&self, text: impl Into<String>) {
        self.inner.state.write().drafts.set_new_comment(text);
    }

    /// Buffered new top-level comment text
    #[must_use]
    pub fn new_comment_draft(&self) -> String {
        self.inner.state.read().drafts.new_comment().to_owned()
    }

    /// Post the buffered new-comment draft
    ///
    /// # Errors
    /// As [`post_top_level_comment`](Self::post_top_level_comment)
    pub async fn post_from_draft(&self, session: &Session) -> Result<WriteOutcome, EngineError> {
        let body = self.new_comment_draft();
        self.post_top_level_comment(session, &body).await
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Current threads, in display order
    #[must_use]
    pub fn threads(&self) -> Vector<Thread> {
        self.inner.state.read().store.threads().clone()
    }

    /// Immutable copy of the store
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.state.read().store.snapshot()
    }

    /// Whether the loaded video has comments turned off
    #[must_use]
    pub fn comments_disabled(&self) -> bool {
        self.inner.state.read().comments_disabled
    }

    /// Whether a listing for the loaded video is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.read().in_flight_listings > 0
    }

    /// Currently loaded video
    #[must_use]
    pub fn loaded_video(&self) -> Option<VideoId> {
        self.inner.state.read().loaded_video.clone()
    }

    /// Video whose deferred resync is waiting to fire
    #[must_use]
    pub fn pending_resync(&self) -> Option<VideoId> {
        self.inner.scheduler.pending_video()
    }

    /// Recorded activity, oldest first
    #[must_use]
    pub fn activity(&self) -> Vec<ActivityEvent> {
        self.inner.activity.events()
    }

    fn record(&self, kind: ActivityKind, details: serde_json::Value) {
        self.inner.activity.record(kind, details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::TracingNotifier;
    use crate::session::Identity;
    use cdesk_gateway::InMemoryGateway;
    use cdesk_store::Author;

    fn session(video: &str) -> Session {
        Session::new(Identity::signed_in("Dana", "https://img/dana")).with_video(VideoId::new(video))
    }

    fn root(id: &str, body: &str) -> Comment {
        Comment::new(CommentId::confirmed(id), Author::new("Ana", ""), body, Utc::now())
    }

    async fn loaded_engine(threads: Vec<Thread>) -> (ReconciliationEngine, Arc<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.seed(&VideoId::new("v1"), threads);
        let engine = ReconciliationEngine::new(Arc::clone(&gateway), TracingNotifier, EngineConfig::default());
        engine
            .load_threads_for_video(&session("v1"), VideoId::new("v1"))
            .await
            .unwrap();
        (engine, gateway)
    }

    #[test]
    fn write_action_messages() {
        assert_eq!(WriteAction::Post.success_message(), "Comment posted!");
        assert_eq!(WriteAction::Reply.failure_message(), "Failed to reply");
        assert_eq!(WriteAction::Delete.to_string(), "delete");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_body_rejected_without_mutation() {
        let (engine, gateway) = loaded_engine(vec![]).await;
        let calls_before = gateway.calls().len();

        let err = engine
            .post_top_level_comment(&session("v1"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::EmptyBody)));
        assert!(engine.threads().is_empty());
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test(start_paused = true)]
    async fn session_must_match_loaded_video() {
        let (engine, _gateway) = loaded_engine(vec![]).await;

        let err = engine
            .post_top_level_comment(&session("other"), "hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::VideoNotLoaded(_))
        ));

        let signed_out = Session::new(Identity::anonymous()).with_video(VideoId::new("v1"));
        let err = engine.post_top_level_comment(&signed_out, "hi").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::NotAuthenticated)
        ));

        let no_video = Session::new(Identity::signed_in("Dana", ""));
        let err = engine.post_top_level_comment(&no_video, "hi").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::NoVideoLoaded)));
    }

    #[tokio::test(start_paused = true)]
    async fn optimistic_author_comes_from_identity() {
        let (engine, _gateway) = loaded_engine(vec![]).await;
        engine
            .post_top_level_comment(&session("v1"), "hello")
            .await
            .unwrap();

        let threads = engine.threads();
        assert_eq!(threads[0].top_level.author.display_name, "Dana");
        assert_eq!(threads[0].reply_count, 0);
        assert!(threads[0].id.is_provisional());
    }

    #[tokio::test(start_paused = true)]
    async fn reply_addressed_by_root_uses_confirmed_parent() {
        let (engine, gateway) = loaded_engine(vec![Thread::new(root("c1", "root"))]).await;

        engine
            .reply_to_thread(&session("v1"), &CommentId::confirmed("c1"), "hi")
            .await
            .unwrap();

        assert!(gateway.calls().contains(&cdesk_gateway::GatewayCall::PostReply {
            parent_id: "c1".into(),
            body: "hi".into(),
        }));
        assert_eq!(engine.threads()[0].replies.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_reply_to_reply_prefills_author() {
        let thread = Thread::new(root("c1", "root")).with_replies([Comment::new(
            CommentId::confirmed("r1"),
            Author::new("Bo", ""),
            "first",
            Utc::now(),
        )]);
        let (engine, _gateway) = loaded_engine(vec![thread]).await;
        let c1 = CommentId::confirmed("c1");

        engine
            .begin_reply_to_reply(&c1, &CommentId::confirmed("r1"))
            .unwrap();
        assert_eq!(engine.reply_draft(&c1), "@Bo ");
        assert_eq!(engine.active_reply_target(), Some(c1.clone()));

        let err = engine
            .begin_reply_to_reply(&c1, &CommentId::confirmed("nope"))
            .unwrap_err();
        assert_eq!(err, ValidationError::CommentNotFound(CommentId::confirmed("nope")));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_listing() {
        let (engine, _gateway) = loaded_engine(vec![]).await;
        assert!(!engine.is_loading());
        assert_eq!(engine.loaded_video(), Some(VideoId::new("v1")));
    }
}
