//! cdesk Store - comment threads held for the loaded video
//!
//! Provides:
//! - The thread/reply model with confirmed and provisional identifiers
//! - A thread store with O(1) immutable snapshots for rollback
//! - Dual-purpose removal: one id addresses either a thread root or a reply
//!
//! # Example
//!
//! ```rust
//! use cdesk_store::{Author, Comment, CommentId, Thread, ThreadStore};
//! use chrono::Utc;
//!
//! let mut store = ThreadStore::new();
//! let root = Comment::new(CommentId::confirmed("c1"), Author::default(), "hi", Utc::now());
//! store.insert_thread_at_front(Thread::new(root));
//!
//! let before = store.snapshot();
//! store.remove_by_id(&CommentId::confirmed("c1"));
//! assert!(store.is_empty());
//!
//! store.restore(before);
//! assert_eq!(store.len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod store;
pub mod types;

pub use store::{Removed, StoreSnapshot, ThreadStore};
pub use types::{Author, Comment, CommentId, Thread, PROVISIONAL_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
