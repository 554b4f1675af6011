//! Unsent input: the new-comment box and per-thread reply boxes.
//!
//! At most one reply box is open at a time (the active reply target), but
//! text typed into each thread's box is kept until that reply is sent or the
//! video changes.

use cdesk_store::CommentId;
use std::collections::HashMap;

/// Draft text held alongside the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drafts {
    new_comment: String,
    replies: HashMap<CommentId, String>,
    reply_target: Option<CommentId>,
}

impl Drafts {
    /// Create empty drafts
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New top-level comment text
    #[must_use]
    pub fn new_comment(&self) -> &str {
        &self.new_comment
    }

    /// Replace the new-comment text
    pub fn set_new_comment(&mut self, text: impl Into<String>) {
        self.new_comment = text.into();
    }

    /// Clear the new-comment text
    pub fn clear_new_comment(&mut self) {
        self.new_comment.clear();
    }

    /// Buffered reply text for a thread, empty if none
    #[must_use]
    pub fn reply(&self, thread_id: &CommentId) -> &str {
        self.replies.get(thread_id).map_or("", String::as_str)
    }

    /// Replace the buffered reply text for a thread
    pub fn set_reply(&mut self, thread_id: CommentId, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.replies.remove(&thread_id);
        } else {
            self.replies.insert(thread_id, text);
        }
    }

    /// Thread whose reply box is open
    #[must_use]
    pub fn reply_target(&self) -> Option<&CommentId> {
        self.reply_target.as_ref()
    }

    /// Open the reply box on `thread_id`, or close it if already open there
    ///
    /// Returns the target after the toggle.
    pub fn toggle_reply_target(&mut self, thread_id: CommentId) -> Option<&CommentId> {
        if self.reply_target.as_ref() == Some(&thread_id) {
            self.reply_target = None;
        } else {
            self.reply_target = Some(thread_id);
        }
        self.reply_target.as_ref()
    }

    /// Open the reply box on `thread_id` with `@<author> ` pre-filled
    pub fn begin_reply_to(&mut self, thread_id: CommentId, author: &str) {
        self.replies.insert(thread_id.clone(), format!("@{author} "));
        self.reply_target = Some(thread_id);
    }

    /// Drop the thread's reply text and close the reply box
    pub fn clear_reply(&mut self, thread_id: &CommentId) {
        self.replies.remove(thread_id);
        self.reply_target = None;
    }

    /// Clear everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
