//! Caller context passed into every engine operation.

use cdesk_gateway::VideoId;
use cdesk_store::Author;

/// Fallback display name for optimistic comments
pub const FALLBACK_DISPLAY_NAME: &str = "You";

/// Current user as reported by the identity provider
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Display name, if the provider has one
    pub display_name: Option<String>,
    /// Avatar URL, if the provider has one
    pub avatar_url: Option<String>,
    /// Whether the user is signed in
    pub authenticated: bool,
    /// OAuth bearer token; consumed by the gateway, never by the engine
    pub bearer: Option<String>,
}

impl Identity {
    /// Signed-in user
    #[must_use]
    pub fn signed_in(display_name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            avatar_url: Some(avatar_url.into()),
            authenticated: true,
            bearer: None,
        }
    }

    /// Signed-out user
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// With bearer token
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Author shown on optimistic comments
    #[must_use]
    pub fn author(&self) -> Author {
        Author::new(
            self.display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()),
            self.avatar_url.clone().unwrap_or_default(),
        )
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("display_name", &self.display_name)
            .field("avatar_url", &self.avatar_url)
            .field("authenticated", &self.authenticated)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identity plus the video the caller is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Current user
    pub identity: Identity,
    /// Currently loaded video, if any
    pub video_id: Option<VideoId>,
}

impl Session {
    /// Session without a video
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            video_id: None,
        }
    }

    /// With video
    #[must_use]
    pub fn with_video(mut self, video_id: VideoId) -> Self {
        self.video_id = Some(video_id);
        self
    }
}
