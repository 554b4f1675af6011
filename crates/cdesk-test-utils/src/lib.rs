//! Testing utilities for the cdesk workspace
//!
//! Shared fixtures, a recording notifier, and a gateway wrapper that holds
//! calls until the test releases them.

#![allow(missing_docs)]

use async_trait::async_trait;
use cdesk_engine::{EngineConfig, Identity, Notice, Notifier, ReconciliationEngine, Session};
use cdesk_gateway::{CommentGateway, GatewayError, InMemoryGateway, Listing, VideoId};
use cdesk_store::{Author, Comment, CommentId, Thread};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const TEST_VIDEO: &str = "vid-1";
pub const OTHER_VIDEO: &str = "vid-2";

/// Resync delay used by the fixtures, matching the production default
pub const RESYNC_DELAY: Duration = Duration::from_secs(10);

pub fn video() -> VideoId {
    VideoId::new(TEST_VIDEO)
}

pub fn other_video() -> VideoId {
    VideoId::new(OTHER_VIDEO)
}

pub fn identity() -> Identity {
    Identity::signed_in("Tester", "https://img.example/tester.png").with_bearer("test-token")
}

pub fn session_for(video: &VideoId) -> Session {
    Session::new(identity()).with_video(video.clone())
}

pub fn session() -> Session {
    session_for(&video())
}

pub fn comment(id: &str, author: &str, body: &str) -> Comment {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
    Comment::new(CommentId::confirmed(id), Author::new(author, ""), body, at)
}

/// Confirmed thread whose root id is `root` with replies `replies`
pub fn thread(root: &str, replies: &[&str]) -> Thread {
    Thread::new(comment(root, "Viewer", &format!("body of {root}")))
        .with_replies(replies.iter().map(|r| comment(r, "Replier", &format!("body of {r}"))))
}

pub fn ids(threads: impl IntoIterator<Item = Thread>) -> Vec<String> {
    threads.into_iter().map(|t| t.id.to_string()).collect()
}

/// Notifier that keeps every notice
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Gateway wrapper that parks calls until permits are released
///
/// Gates start closed; ungated call kinds pass straight through.
#[derive(Debug)]
pub struct GatedGateway<G> {
    inner: G,
    writes: Option<Arc<Semaphore>>,
    listings: Option<Arc<Semaphore>>,
}

impl<G: CommentGateway> GatedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            writes: None,
            listings: None,
        }
    }

    #[must_use]
    pub fn gate_writes(mut self) -> Self {
        self.writes = Some(Arc::new(Semaphore::new(0)));
        self
    }

    #[must_use]
    pub fn gate_listings(mut self) -> Self {
        self.listings = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release_writes(&self, count: usize) {
        if let Some(gate) = &self.writes {
            gate.add_permits(count);
        }
    }

    pub fn release_listings(&self, count: usize) {
        if let Some(gate) = &self.listings {
            gate.add_permits(count);
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    async fn pass(gate: Option<&Arc<Semaphore>>) {
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl<G: CommentGateway> CommentGateway for GatedGateway<G> {
    async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError> {
        Self::pass(self.listings.as_ref()).await;
        self.inner.list_threads(video_id).await
    }

    async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError> {
        Self::pass(self.writes.as_ref()).await;
        self.inner.post_top_level_comment(video_id, body).await
    }

    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError> {
        Self::pass(self.writes.as_ref()).await;
        self.inner.post_reply(parent_id, body).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError> {
        Self::pass(self.writes.as_ref()).await;
        self.inner.delete_by_id(id).await
    }
}

/// Engine over an in-memory gateway seeded with `threads` for [`video`]
pub fn setup_engine(
    threads: impl IntoIterator<Item = Thread>,
) -> (ReconciliationEngine, Arc<InMemoryGateway>, RecordingNotifier) {
    let gateway = Arc::new(InMemoryGateway::new().with_author(Author::new("Tester", "")));
    gateway.seed(&video(), threads);
    let notifier = RecordingNotifier::new();
    let engine = ReconciliationEngine::new(
        Arc::clone(&gateway),
        notifier.clone(),
        EngineConfig::new().with_resync_delay(RESYNC_DELAY),
    );
    (engine, gateway, notifier)
}

/// Let spawned tasks run without advancing a paused clock
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
