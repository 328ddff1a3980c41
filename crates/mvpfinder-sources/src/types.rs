//! Wire types for the Product Hunt GraphQL API and Reddit listings.
//!
//! ### Product Hunt
//! Responses always carry a `data` object; on failure `data` may be `null`
//! and an `errors` array explains why (HTTP status is still 200). Maker
//! usernames are sometimes replaced by a placeholder such as `[REDACTED]`,
//! in which case the display `name` is the only usable author.
//!
//! ### Reddit
//! `created_utc` is a float of epoch seconds. `author` is `null` for deleted
//! accounts in some listings and `"[deleted]"` in others. `url` equals the
//! permalink URL for self posts.

use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Product Hunt
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
}

/// Post nodes stay untyped until [`crate::RawItem::decode`] so one bad node
/// does not fail the page.
#[derive(Debug, Deserialize)]
pub(crate) struct PostsData {
    pub(crate) posts: Connection<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicsData {
    pub(crate) topics: Connection<ProductHuntTopic>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<N> {
    #[serde(default = "Vec::new")]
    pub(crate) edges: Vec<Edge<N>>,
    #[serde(rename = "pageInfo", default)]
    pub(crate) page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<N> {
    pub(crate) node: N,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    pub(crate) has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub(crate) end_cursor: Option<String>,
}

/// A launched product as returned by the `posts` query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductHuntPost {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "votesCount", default)]
    pub votes_count: i64,
    #[serde(rename = "commentsCount", default)]
    pub comments_count: i64,
    /// RFC 3339 timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(default)]
    pub makers: Vec<ProductHuntMaker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductHuntMaker {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A Product Hunt topic; its `slug` is the channel name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductHuntTopic {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "postsCount", default)]
    pub posts_count: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
}

// ---------------------------------------------------------------------------
// Reddit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub(crate) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub(crate) children: Vec<ListingChild>,
    pub(crate) after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingChild {
    /// Decoded per child into a [`RedditPost`].
    pub(crate) data: Value,
}

/// A submission from a subreddit listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RedditPost {
    /// Base-36 id without the `t3_` prefix.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    pub permalink: String,
    #[serde(default)]
    pub url: Option<String>,
    pub created_utc: f64,
}
