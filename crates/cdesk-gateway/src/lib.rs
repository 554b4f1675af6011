//! cdesk Gateway - the remote comment API seam
//!
//! The reconciliation engine only sees [`CommentGateway`]: four best-effort
//! calls whose observable outcomes are success, failure, or (for listings)
//! "comments disabled". Implementations:
//! - [`YouTubeGateway`]: YouTube Data API v3 over HTTPS
//! - [`InMemoryGateway`]: process-local backend for demos and tests

#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod video;
pub mod youtube;

use async_trait::async_trait;
use cdesk_store::Thread;
use std::sync::Arc;

pub use error::GatewayError;
pub use memory::{GatewayCall, InMemoryGateway};
pub use video::VideoId;
pub use youtube::{YouTubeConfig, YouTubeGateway};

/// Result of listing a video's comment threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Authoritative threads, in display order
    Threads(Vec<Thread>),
    /// The video has comments turned off
    CommentsDisabled,
}

/// Remote comment API as seen by the engine
///
/// No retry, batching or pagination happens behind this trait.
#[async_trait]
pub trait CommentGateway: Send + Sync {
    /// List the current threads of a video
    async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError>;

    /// Create a top-level comment on a video
    async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError>;

    /// Reply to the thread identified by `parent_id`
    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError>;

    /// Delete a thread root or a reply
    async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: CommentGateway + ?Sized> CommentGateway for Arc<G> {
    async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError> {
        (**self).list_threads(video_id).await
    }

    async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError> {
        (**self).post_top_level_comment(video_id, body).await
    }

    async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError> {
        (**self).post_reply(parent_id, body).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError> {
        (**self).delete_by_id(id).await
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
