//! In-memory comment gateway for offline demos and tests.
//!
//! Writes are visible to listings immediately. Failures can be scripted per
//! call kind and every call is recorded.

use crate::error::GatewayError;
use crate::video::VideoId;
use crate::{CommentGateway, Listing};
use async_trait::async_trait;
use cdesk_store::{Author, Comment, CommentId, Thread};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// A call received by [`InMemoryGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `list_threads`
    ListThreads(VideoId),
    /// `post_top_level_comment`
    PostTopLevel {
        /// Target video
        video_id: VideoId,
        /// Comment text
        body: String,
    },
    /// `post_reply`
    PostReply {
        /// Parent thread id
        parent_id: String,
        /// Reply text
        body: String,
    },
    /// `delete_by_id`
    Delete(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    videos: HashMap<VideoId, Vec<Thread>>,
    disabled: HashSet<VideoId>,
    failing_listings: usize,
    failing_writes: usize,
    next_id: u64,
    calls: Vec<GatewayCall>,
}

impl MemoryState {
    fn next_id(&mut self) -> CommentId {
        self.next_id += 1;
        CommentId::confirmed(format!("mem-{}", self.next_id))
    }

    fn take_write_failure(&mut self) -> Option<GatewayError> {
        if self.failing_writes == 0 {
            return None;
        }
        self.failing_writes -= 1;
        Some(GatewayError::api(500, "scripted write failure"))
    }
}

/// Gateway that keeps threads per video in memory
#[derive(Debug)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    author: Author,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Create empty gateway
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            author: Author::new("You", ""),
        }
    }

    /// With the author attached to comments written through this gateway
    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    /// Install the remote threads of a video, newest first
    pub fn seed(&self, video_id: &VideoId, threads: impl IntoIterator<Item = Thread>) {
        self.state
            .lock()
            .videos
            .insert(video_id.clone(), threads.into_iter().collect());
    }

    /// Turn comments off (or back on) for a video
    pub fn set_comments_disabled(&self, video_id: &VideoId, disabled: bool) {
        let mut state = self.state.lock();
        if disabled {
            state.disabled.insert(video_id.clone());
        } else {
            state.disabled.remove(video_id);
        }
    }

    /// Fail the next `count` listings with a server error
    pub fn fail_next_listings(&self, count: usize) {
        self.state.lock().failing_listings = count;
    }

    /// Fail the next `count` writes (post, reply, delete) with a server error
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().failing_writes = count;
    }

    /// Current remote threads of a video
    #[must_use]
    pub fn threads(&self, video_id: &VideoId) -> Vec<Thread> {
        self.state
            .lock()
            .videos
            .get(video_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    /// Number of listings received for a video
    #[must_use]
    pub fn listing_count(&self, video_id: &VideoId) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::ListThreads(v) if v == video_id))
            .count()
    }

    fn comment(&self, id: CommentId, body: &str) -> Comment {
        Comment::new(id, self.author.clone(), body, Utc::now())
    }
}

#[async_trait]
impl CommentGateway for InMemoryGateway {
    async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::ListThreads(video_id.clone()));

        if state.failing_listings > 0 {
            state.failing_listings -= 1;
            return Err(GatewayError::api(500, "scripted listing failure"));
        }
        if state.disabled.contains(video_id) {
            return Ok(Listing::CommentsDisabled);
        }
        Ok(Listing::Threads(
            state.videos.get(video_id).cloned().unwrap_or_default(),
        ))
    }

    async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::PostTopLevel {
            video_id: video_id.clone(),
            body: body.to_string(),
        });

        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }
        if state.disabled.contains(video_id) {
            return Err(GatewayError::api(403, "comments are disabled for this video"));
        }
        let id = state.next_id();
        let thread = Thread::new(self.comment(id, body));
        state
            .videos
            .entry(video_id.clone())
            .or_default()
            .insert(0, thread);
        Ok(())
    }

    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::PostReply {
            parent_id: parent_id.to_string(),
            body: body.to_string(),
        });

        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }
        let parent = CommentId::confirmed(parent_id);
        let id = state.next_id();
        let reply = self.comment(id, body);
        let thread = state
            .videos
            .values_mut()
            .flat_map(|threads| threads.iter_mut())
            .find(|t| t.is_addressed_by(&parent))
            .ok_or_else(|| GatewayError::api(404, format!("parent comment {parent_id} not found")))?;

        thread.replies.push_back(reply);
        thread.reply_count += 1;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Delete(id.to_string()));

        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }
        let target = CommentId::confirmed(id);
        for threads in state.videos.values_mut() {
            if let Some(index) = threads.iter().position(|t| t.is_addressed_by(&target)) {
                threads.remove(index);
                return Ok(());
            }
            for thread in threads.iter_mut() {
                if let Some(position) = thread.replies.iter().position(|r| r.id == target) {
                    thread.replies.remove(position);
                    thread.reply_count = thread.reply_count.saturating_sub(1);
                    return Ok(());
                }
            }
        }
        Err(GatewayError::api(404, format!("comment {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoId {
        VideoId::new("vid1")
    }

    #[tokio::test]
    async fn post_then_list_shows_confirmed_thread() {
        let gateway = InMemoryGateway::new();
        gateway.post_top_level_comment(&video(), "hello").await.unwrap();

        let Listing::Threads(threads) = gateway.list_threads(&video()).await.unwrap() else {
            panic!("expected threads");
        };
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].top_level.body, "hello");
        assert!(!threads[0].id.is_provisional());
    }

    #[tokio::test]
    async fn reply_and_delete_round() {
        let gateway = InMemoryGateway::new();
        gateway.post_top_level_comment(&video(), "root").await.unwrap();
        gateway.post_reply("mem-1", "child").await.unwrap();

        let threads = gateway.threads(&video());
        assert_eq!(threads[0].reply_count, 1);
        assert_eq!(threads[0].replies[0].id, CommentId::confirmed("mem-2"));

        gateway.delete_by_id("mem-2").await.unwrap();
        assert!(gateway.threads(&video())[0].replies.is_empty());
        gateway.delete_by_id("mem-1").await.unwrap();
        assert!(gateway.threads(&video()).is_empty());

        assert_eq!(
            gateway.delete_by_id("mem-1").await,
            Err(GatewayError::api(404, "comment mem-1 not found"))
        );
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next_writes(1);
        assert!(gateway.post_top_level_comment(&video(), "x").await.is_err());
        assert!(gateway.post_top_level_comment(&video(), "x").await.is_ok());

        gateway.fail_next_listings(1);
        assert!(gateway.list_threads(&video()).await.is_err());
        assert!(gateway.list_threads(&video()).await.is_ok());
        assert_eq!(gateway.listing_count(&video()), 2);
    }

    #[tokio::test]
    async fn disabled_video_reports_disabled() {
        let gateway = InMemoryGateway::new();
        gateway.set_comments_disabled(&video(), true);
        assert_eq!(gateway.list_threads(&video()).await, Ok(Listing::CommentsDisabled));

        gateway.set_comments_disabled(&video(), false);
        assert_eq!(gateway.list_threads(&video()).await, Ok(Listing::Threads(Vec::new())));
    }
}
