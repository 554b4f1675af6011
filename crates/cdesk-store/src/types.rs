//! Comment thread model
//!
//! Defines the entities held by the thread store:
//! - Comment identifiers (confirmed or provisional)
//! - Authors
//! - Comments (thread roots and replies share one shape)
//! - Threads with their ordered replies

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use ulid::Ulid;

/// Prefix used when rendering provisional identifiers
pub const PROVISIONAL_PREFIX: &str = "local-";

/// Identifier of a thread, thread root, or reply
///
/// Thread roots and replies live in a single id space: the remote system
/// addresses both with the same kind of identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CommentId {
    /// Assigned by the remote system
    Confirmed(String),
    /// Generated locally for an optimistic insertion
    Provisional(Ulid),
}

impl CommentId {
    /// Wrap an identifier assigned by the remote system
    #[inline]
    #[must_use]
    pub fn confirmed(id: impl Into<String>) -> Self {
        Self::Confirmed(id.into())
    }

    /// Generate a new provisional identifier
    ///
    /// ULIDs carry the creation millisecond plus 80 random bits, so two
    /// provisional ids generated in the same millisecond still differ.
    #[inline]
    #[must_use]
    pub fn provisional() -> Self {
        Self::Provisional(Ulid::new())
    }

    /// Whether this id is still pending remote confirmation
    #[inline]
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// Remote identifier, if confirmed
    #[inline]
    #[must_use]
    pub fn as_confirmed(&self) -> Option<&str> {
        match self {
            Self::Confirmed(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "{id}"),
            Self::Provisional(ulid) => write!(f, "{PROVISIONAL_PREFIX}{ulid}"),
        }
    }
}

impl FromStr for CommentId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let provisional = s
            .strip_prefix(PROVISIONAL_PREFIX)
            .and_then(|rest| Ulid::from_string(rest).ok());
        Ok(match provisional {
            Some(ulid) => Self::Provisional(ulid),
            None => Self::Confirmed(s.to_string()),
        })
    }
}

impl From<&str> for CommentId {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

/// Comment author as displayed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    /// Display name
    pub display_name: String,
    /// Avatar image reference (URL); empty when unknown
    pub avatar_url: String,
}

impl Author {
    /// Create new author
    #[inline]
    #[must_use]
    pub fn new(display_name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// A single comment: either a thread root or a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: CommentId,
    /// Author
    pub author: Author,
    /// Display text
    pub body: String,
    /// Publication timestamp
    pub published_at: DateTime<Utc>,
}

impl Comment {
    /// Create new comment
    #[inline]
    #[must_use]
    pub fn new(
        id: CommentId,
        author: Author,
        body: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author,
            body: body.into(),
            published_at,
        }
    }
}

/// A top-level comment together with its replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Thread identifier (replies are addressed to it)
    pub id: CommentId,
    /// Root comment of the thread
    pub top_level: Comment,
    /// Reply count reported by the remote system; informational only
    pub reply_count: u32,
    /// Replies, oldest first; provisional replies are appended last
    pub replies: Vector<Comment>,
}

impl Thread {
    /// Create a thread whose id matches its root comment
    #[inline]
    #[must_use]
    pub fn new(top_level: Comment) -> Self {
        Self {
            id: top_level.id.clone(),
            top_level,
            reply_count: 0,
            replies: Vector::new(),
        }
    }

    /// With an explicit thread id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: CommentId) -> Self {
        self.id = id;
        self
    }

    /// With replies; the reply count follows the list length
    #[must_use]
    pub fn with_replies(mut self, replies: impl IntoIterator<Item = Comment>) -> Self {
        self.replies = replies.into_iter().collect();
        self.reply_count = u32::try_from(self.replies.len()).unwrap_or(u32::MAX);
        self
    }

    /// With a remote-reported reply count
    #[inline]
    #[must_use]
    pub fn with_reply_count(mut self, reply_count: u32) -> Self {
        self.reply_count = reply_count;
        self
    }

    /// Whether this thread's id, root id, or any reply id equals `id`
    #[must_use]
    pub fn contains_id(&self, id: &CommentId) -> bool {
        self.id == *id || self.top_level.id == *id || self.replies.iter().any(|r| r.id == *id)
    }

    /// Whether `id` addresses the whole thread (thread id or root comment id)
    #[inline]
    #[must_use]
    pub fn is_addressed_by(&self, id: &CommentId) -> bool {
        self.id == *id || self.top_level.id == *id
    }

    /// Find a reply by id
    #[must_use]
    pub fn reply(&self, id: &CommentId) -> Option<&Comment> {
        self.replies.iter().find(|r| r.id == *id)
    }

    /// All identifiers held by this thread
    pub fn ids(&self) -> impl Iterator<Item = &CommentId> {
        std::iter::once(&self.id)
            .chain(std::iter::once(&self.top_level.id))
            .chain(self.replies.iter().map(|r| &r.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, body: &str) -> Comment {
        Comment::new(CommentId::confirmed(id), Author::new("a", ""), body, Utc::now())
    }

    #[test]
    fn provisional_ids_differ() {
        let a = CommentId::provisional();
        let b = CommentId::provisional();
        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(a.as_confirmed().is_none());
    }

    #[test]
    fn comment_id_display_parse() {
        let provisional = CommentId::provisional();
        let parsed: CommentId = provisional.to_string().parse().unwrap();
        assert_eq!(parsed, provisional);
        assert!(provisional.to_string().starts_with(PROVISIONAL_PREFIX));

        let confirmed = CommentId::from("UgxAbc123");
        assert_eq!(confirmed, CommentId::confirmed("UgxAbc123"));
        assert_eq!(confirmed.to_string(), "UgxAbc123");

        // Prefix without a valid ULID is a plain remote id
        assert_eq!(
            CommentId::from("local-nope"),
            CommentId::confirmed("local-nope")
        );
    }

    #[test]
    fn thread_builder() {
        let thread = Thread::new(comment("t1", "root"))
            .with_replies(vec![comment("r1", "a"), comment("r2", "b")]);

        assert_eq!(thread.id, CommentId::confirmed("t1"));
        assert_eq!(thread.reply_count, 2);
        assert!(thread.contains_id(&CommentId::confirmed("r2")));
        assert!(thread.is_addressed_by(&CommentId::confirmed("t1")));
        assert!(!thread.is_addressed_by(&CommentId::confirmed("r1")));
        assert_eq!(thread.ids().count(), 4);
    }

    #[test]
    fn thread_id_may_differ_from_root() {
        let thread = Thread::new(comment("c1", "root")).with_id(CommentId::confirmed("t1"));
        assert!(thread.is_addressed_by(&CommentId::confirmed("c1")));
        assert!(thread.is_addressed_by(&CommentId::confirmed("t1")));
    }
}
