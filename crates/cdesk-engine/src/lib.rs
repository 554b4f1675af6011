//! cdesk Engine - optimistic comment moderation against an eventually
//! consistent API
//!
//! Provides:
//! - [`ReconciliationEngine`]: optimistic post/reply/delete with rollback
//! - Deferred full resync that never touches a video loaded later
//! - "Comments disabled" handling that suppresses writes
//! - Reply/new-comment drafts, an activity log, and TOML configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use cdesk_engine::prelude::*;
//! use cdesk_gateway::InMemoryGateway;
//!
//! # async fn example() -> Result<(), EngineError> {
//! let engine = ReconciliationEngine::new(
//!     InMemoryGateway::new(),
//!     TracingNotifier,
//!     EngineConfig::default(),
//! );
//!
//! let video = VideoId::new("dQw4w9WgXcQ");
//! let session = Session::new(Identity::signed_in("Dana", "")).with_video(video.clone());
//!
//! engine.load_threads_for_video(&session, video).await?;
//! engine.post_top_level_comment(&session, "First!").await?;
//! assert_eq!(engine.threads().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod activity;
pub mod config;
pub mod drafts;
pub mod engine;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod session;

pub use activity::{ActivityEvent, ActivityKind, ActivityLog};
pub use config::{DeskConfig, EngineConfig, DEFAULT_RESYNC_DELAY_MS};
pub use drafts::Drafts;
pub use engine::{LoadOutcome, ReconciliationEngine, WriteAction, WriteOutcome};
pub use error::{ConfigError, EngineError, ValidationError};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use scheduler::ResyncScheduler;
pub use session::{Identity, Session, FALLBACK_DISPLAY_NAME};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        DeskConfig, EngineConfig, EngineError, Identity, LoadOutcome, Notice, Notifier,
        ReconciliationEngine, Session, TracingNotifier, ValidationError, WriteOutcome,
    };
    pub use cdesk_gateway::{CommentGateway, VideoId};
    pub use cdesk_store::{CommentId, Thread};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
