//! Ranked content feed.
//!
//! [`RedditFeed`] reads a listing endpoint (`{base_url}/top.json?limit=N`)
//! and maps each child post onto a [`Candidate`]. Parsing is split out into
//! [`parse_listing`] so it can be tested without the network.

use crate::http::{FetchError, HttpClient};
use crate::types::Candidate;
use chrono::DateTime;
use serde::Deserialize;

/// Source of ranked candidates, best first.
pub trait FeedClient {
    /// Return at most `limit` candidates in feed order.
    fn fetch_ranked(&self, limit: usize) -> Result<Vec<Candidate>, FetchError>;
}

/// Short-link prefix used to build permalinks from post ids.
const PERMALINK_BASE: &str = "https://redd.it/";

pub struct RedditFeed {
    http: HttpClient,
    base_url: String,
}

impl RedditFeed {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl FeedClient for RedditFeed {
    fn fetch_ranked(&self, limit: usize) -> Result<Vec<Candidate>, FetchError> {
        let url = format!("{}/top.json", self.base_url);
        let limit_param = limit.to_string();
        let body = self.http.get_text(&url, &[("limit", limit_param.as_str())])?;
        let mut candidates = parse_listing(&body)?;
        candidates.truncate(limit);
        Ok(candidates)
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawPost,
}

#[derive(Deserialize)]
struct RawPost {
    id: String,
    title: String,
    url: String,
    author: String,
    #[serde(default)]
    ups: Option<i64>,
    created_utc: f64,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    is_video: bool,
}

/// Parse a listing payload into candidates, preserving feed order.
pub fn parse_listing(body: &str) -> Result<Vec<Candidate>, FetchError> {
    let listing: Listing = serde_json::from_str(body)?;
    listing
        .data
        .children
        .into_iter()
        .map(|child| into_candidate(child.data))
        .collect()
}

fn into_candidate(post: RawPost) -> Result<Candidate, FetchError> {
    let secs = post.created_utc.trunc() as i64;
    let nanos = (post.created_utc.fract() * 1e9) as u32;
    let created_at = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
        FetchError::Malformed(format!(
            "post {} has out-of-range created_utc {}",
            post.id, post.created_utc
        ))
    })?;

    Ok(Candidate {
        source_url: format!("{PERMALINK_BASE}{}", post.id),
        id: post.id,
        title: post.title,
        image_url: post.url,
        author: post.author,
        popularity: post.ups,
        created_at,
        is_adult: post.over_18,
        is_video: post.is_video,
    })
}
