//! YouTube Data API v3 JSON shapes
//!
//! Only the fields the thread store needs are decoded.

use crate::error::GatewayError;
use crate::Listing;
use cdesk_store::{Author, Comment, CommentId, Thread};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Error reason reported when a video has comments turned off
pub const COMMENTS_DISABLED_REASON: &str = "commentsDisabled";

#[derive(Debug, Deserialize)]
struct ThreadListResponse {
    #[serde(default)]
    items: Vec<ThreadResource>,
}

#[derive(Debug, Deserialize)]
struct ThreadResource {
    id: String,
    snippet: ThreadSnippet,
    #[serde(default)]
    replies: Option<RepliesResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: CommentResource,
    #[serde(default)]
    total_reply_count: u32,
}

#[derive(Debug, Deserialize)]
struct RepliesResource {
    #[serde(default)]
    comments: Vec<CommentResource>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    id: String,
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    author_profile_image_url: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

impl From<CommentResource> for Comment {
    fn from(resource: CommentResource) -> Self {
        let snippet = resource.snippet;
        Comment::new(
            CommentId::confirmed(resource.id),
            Author::new(snippet.author_display_name, snippet.author_profile_image_url),
            snippet.text_display,
            snippet.published_at,
        )
    }
}

impl From<ThreadResource> for Thread {
    fn from(resource: ThreadResource) -> Self {
        let replies = resource
            .replies
            .map(|r| r.comments)
            .unwrap_or_default()
            .into_iter()
            .map(Comment::from);

        Thread::new(resource.snippet.top_level_comment.into())
            .with_id(CommentId::confirmed(resource.id))
            .with_replies(replies)
            .with_reply_count(resource.snippet.total_reply_count)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decode a `commentThreads.list` response
///
/// A `commentsDisabled` error reason is a listing outcome, not a failure.
///
/// # Errors
/// - `GatewayError::Api` for any other non-success status
/// - `GatewayError::Decode` if a success body does not match the schema
pub fn parse_listing(status: u16, body: &str) -> Result<Listing, GatewayError> {
    if !is_success(status) {
        let envelope = decode_error(body);
        if envelope
            .as_ref()
            .and_then(|e| e.error.errors.first())
            .is_some_and(|item| item.reason == COMMENTS_DISABLED_REASON)
        {
            return Ok(Listing::CommentsDisabled);
        }
        return Err(api_error(status, envelope, body));
    }

    let response: ThreadListResponse = serde_json::from_str(body)?;
    Ok(Listing::Threads(
        response.items.into_iter().map(Thread::from).collect(),
    ))
}

/// Check the response of an insert or delete call
///
/// # Errors
/// `GatewayError::Api` for a non-success status
pub fn check_write(status: u16, body: &str) -> Result<(), GatewayError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(api_error(status, decode_error(body), body))
    }
}

fn decode_error(body: &str) -> Option<ErrorEnvelope> {
    serde_json::from_str(body).ok()
}

fn api_error(status: u16, envelope: Option<ErrorEnvelope>, body: &str) -> GatewayError {
    let message = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());
    GatewayError::api(status, message)
}

/// Request body for `commentThreads.insert`
#[must_use]
pub fn top_level_comment_body(video_id: &str, text: &str) -> Value {
    json!({
        "snippet": {
            "videoId": video_id,
            "topLevelComment": { "snippet": { "textOriginal": text } }
        }
    })
}

/// Request body for `comments.insert`
#[must_use]
pub fn reply_body(parent_id: &str, text: &str) -> Value {
    json!({
        "snippet": {
            "parentId": parent_id,
            "textOriginal": text
        }
    })
}
