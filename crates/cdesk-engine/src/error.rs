//! Error types for the reconciliation engine
//!
//! Taxonomy:
//! - Validation failures are rejected before any mutation
//! - Remote write failures are rolled back locally, then reported
//! - Listing failures leave the store as it was
//!
//! "Comments disabled" is not an error; see `WriteOutcome::Suppressed`.

use crate::engine::WriteAction;
use cdesk_gateway::{GatewayError, VideoId};
use cdesk_store::CommentId;
use std::path::PathBuf;

/// Operation refused before touching the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Comment or reply text is blank
    #[error("comment text is empty")]
    EmptyBody,

    /// The session has no video
    #[error("no video loaded")]
    NoVideoLoaded,

    /// The session names a video whose threads are not loaded
    #[error("video {0} is not the loaded video")]
    VideoNotLoaded(VideoId),

    /// The caller is not signed in
    #[error("not authenticated")]
    NotAuthenticated,

    /// Reply target is not in the store
    #[error("thread not found: {0}")]
    ThreadNotFound(CommentId),

    /// Comment is not in the store
    #[error("comment not found: {0}")]
    CommentNotFound(CommentId),

    /// Target only exists locally and is still awaiting confirmation
    #[error("comment {0} is still pending confirmation")]
    PendingTarget(CommentId),
}

/// Engine operation failure
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Rejected before any mutation
    #[error("invalid operation: {0}")]
    Validation(#[from] ValidationError),

    /// Remote write failed; the local change has already been undone
    #[error("{action} failed: {source}")]
    RemoteWrite {
        /// Which write failed
        action: WriteAction,
        /// Gateway failure
        #[source]
        source: GatewayError,
    },

    /// Listing threads failed; the store was left untouched
    #[error("comment listing failed: {0}")]
    Fetch(#[source] GatewayError),
}

impl EngineError {
    /// Check if the operation was refused up front
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if a remote write failed (and was rolled back)
    #[inline]
    #[must_use]
    pub fn is_remote_write(&self) -> bool {
        matches!(self, Self::RemoteWrite { .. })
    }

    /// Underlying gateway failure, if any
    #[must_use]
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::RemoteWrite { source, .. } | Self::Fetch(source) => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but are out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}
