//! Normalization from raw API shapes to [`mvpfinder_core::NewContentItem`].
//!
//! Text fields are truncated by characters to the storage limits rather than
//! rejected.

use chrono::{DateTime, Utc};
use mvpfinder_core::{NewContentItem, SourceChannel, SourcePlatform};

use crate::author::AuthorRedaction;
use crate::error::SourceError;
use crate::types::{ProductHuntPost, RedditPost};

pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_AUTHOR_CHARS: usize = 100;
pub const MAX_BODY_CHARS: usize = 5000;
pub const MAX_URL_CHARS: usize = 500;

const REDDIT_WEB_ORIGIN: &str = "https://www.reddit.com";

/// Returns at most `max` characters of `s`, never splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Normalizes a Product Hunt post into a [`NewContentItem`].
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if `createdAt` is not RFC 3339.
pub fn normalize_product_hunt(
    post: &ProductHuntPost,
    channel: &SourceChannel,
    redaction: &AuthorRedaction,
) -> Result<NewContentItem, SourceError> {
    let created_at_source = DateTime::parse_from_rfc3339(&post.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SourceError::Normalization {
            external_id: post.id.clone(),
            reason: format!("invalid createdAt '{}': {e}", post.created_at),
        })?;

    let tagline = post.tagline.clone().unwrap_or_default();
    let body = post
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(&tagline);

    Ok(NewContentItem {
        external_id: post.id.clone(),
        platform: SourcePlatform::ProductHunt,
        channel_id: channel.id,
        title: truncate_chars(&post.name, MAX_TITLE_CHARS),
        body: truncate_chars(body, MAX_BODY_CHARS),
        tagline,
        author: truncate_chars(&product_hunt_author(post, redaction), MAX_AUTHOR_CHARS),
        score: post.votes_count,
        votes: post.votes_count,
        comments: post.comments_count,
        source_url: truncate_chars(&post.url, MAX_URL_CHARS),
        external_site_url: post
            .website
            .as_deref()
            .filter(|w| !w.is_empty())
            .map(|w| truncate_chars(w, MAX_URL_CHARS)),
        created_at_source,
    })
}

/// First maker's username, their display name when the username is
/// redacted, or `"unknown"`.
fn product_hunt_author(post: &ProductHuntPost, redaction: &AuthorRedaction) -> String {
    let Some(maker) = post.makers.first() else {
        return "unknown".to_string();
    };

    let username = maker.username.as_deref().unwrap_or_default();
    if !redaction.is_redacted(username) {
        return username.trim().to_string();
    }

    maker
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}

/// Normalizes a Reddit submission into a [`NewContentItem`].
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if `created_utc` is out of range.
pub fn normalize_reddit(
    post: &RedditPost,
    channel: &SourceChannel,
) -> Result<NewContentItem, SourceError> {
    #[allow(clippy::cast_possible_truncation)]
    let created_at_source = DateTime::from_timestamp(post.created_utc.trunc() as i64, 0)
        .filter(|_| post.created_utc.is_finite())
        .ok_or_else(|| SourceError::Normalization {
            external_id: post.id.clone(),
            reason: format!("invalid created_utc {}", post.created_utc),
        })?;

    let source_url = format!("{REDDIT_WEB_ORIGIN}{}", post.permalink);
    let link = post.url.as_deref().filter(|u| !u.is_empty());

    let body = if post.selftext.is_empty() {
        link.map(|u| format!("Link: {u}")).unwrap_or_default()
    } else {
        post.selftext.clone()
    };

    let author = post
        .author
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or("[deleted]");

    Ok(NewContentItem {
        external_id: post.id.clone(),
        platform: SourcePlatform::Reddit,
        channel_id: channel.id,
        title: truncate_chars(&post.title, MAX_TITLE_CHARS),
        tagline: String::new(),
        body: truncate_chars(&body, MAX_BODY_CHARS),
        author: truncate_chars(author, MAX_AUTHOR_CHARS),
        score: post.score,
        votes: post.score,
        comments: post.num_comments,
        external_site_url: link
            .filter(|u| *u != source_url)
            .map(|u| truncate_chars(u, MAX_URL_CHARS)),
        source_url: truncate_chars(&source_url, MAX_URL_CHARS),
        created_at_source,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
