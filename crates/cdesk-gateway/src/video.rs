//! Video identifiers
//!
//! Users paste either a bare id or a watch/short link; both resolve to the
//! same [`VideoId`].

use serde::{Deserialize, Serialize};
use url::Url;

/// Identifier of a video on the remote platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap an already extracted id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve user input into a video id
    ///
    /// Accepts a bare id, `youtube.com/watch?v=<id>` (scheme optional) and
    /// `youtu.be/<id>`. Input that looks like a link but does not parse is
    /// taken verbatim. Returns `None` for blank input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if !(input.contains("youtube.com") || input.contains("youtu.be")) {
            return Some(Self::new(input));
        }

        let candidate = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };
        let Ok(url) = Url::parse(&candidate) else {
            return Some(Self::new(input));
        };

        let extracted = if url.host_str().is_some_and(|h| h.contains("youtu.be")) {
            url.path().trim_start_matches('/').to_string()
        } else {
            url.query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        };

        if extracted.is_empty() {
            Some(Self::new(input))
        } else {
            Some(Self(extracted))
        }
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(VideoId::parse(" dQw4w9WgXcQ "), Some(VideoId::new("dQw4w9WgXcQ")));
    }

    #[test]
    fn blank_input_is_none() {
        assert_eq!(VideoId::parse("   "), None);
    }

    #[test]
    fn watch_url_with_and_without_scheme() {
        let expected = Some(VideoId::new("dQw4w9WgXcQ"));
        assert_eq!(VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"), expected);
        assert_eq!(VideoId::parse("youtube.com/watch?v=dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn short_link() {
        assert_eq!(
            VideoId::parse("https://youtu.be/dQw4w9WgXcQ"),
            Some(VideoId::new("dQw4w9WgXcQ"))
        );
        assert_eq!(VideoId::parse("youtu.be/abc123"), Some(VideoId::new("abc123")));
    }

    #[test]
    fn watch_url_without_v_falls_back_to_input() {
        assert_eq!(
            VideoId::parse("https://www.youtube.com/feed"),
            Some(VideoId::new("https://www.youtube.com/feed"))
        );
    }
}
