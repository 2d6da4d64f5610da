//! Publishing a finalized candidate.
//!
//! [`GraphPublisher`] performs the three-step graph-API sequence: create a
//! media container from the image URL and caption, publish the container,
//! then comment on the new post with an attribution line. Credentials are
//! supplied ready to use; this module never refreshes tokens.
//!
//! [`LogPublisher`] only logs what would be posted (dry runs, local hosting).

use crate::http::{FetchError, HttpClient};
use crate::types::{FinalizedCandidate, ImageRef};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("{step} request failed: {source}")]
    Request {
        step: &'static str,
        #[source]
        source: FetchError,
    },
    #[error("{step} returned no id: {body}")]
    MissingId { step: &'static str, body: String },
    #[error("publisher needs a public URL, got local path {0}")]
    NotAUrl(String),
    #[error("failed to read hashtags from {path}: {source}")]
    Hashtags {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ids assigned by the platform during publishing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    pub media_id: Option<String>,
    pub comment_id: Option<String>,
}

pub trait Publisher {
    fn publish(&self, post: &FinalizedCandidate) -> Result<PublishReceipt, PublishError>;
}

/// Load hashtags, one per line; blank lines and a leading `#` are stripped.
pub fn load_hashtags(path: &Path) -> Result<Vec<String>, PublishError> {
    let content = std::fs::read_to_string(path).map_err(|source| PublishError::Hashtags {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(|l| l.trim().trim_start_matches('#'))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Title, a blank line, then `count` distinct hashtags picked at random.
///
/// With fewer than `count` hashtags available, all of them are used.
pub fn compose_caption(
    title: &str,
    hashtags: &[String],
    count: usize,
    rng: &mut impl Rng,
) -> String {
    let tags: Vec<String> = hashtags
        .choose_multiple(rng, count)
        .map(|tag| format!("#{tag}"))
        .collect();
    if tags.is_empty() {
        return title.to_string();
    }
    format!("{title}\n\n{}", tags.join(" "))
}

/// Attribution comment: score, author, and the permalink without its scheme.
pub fn attribution_comment(post: &FinalizedCandidate) -> String {
    let link = post
        .permalink()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let score = post
        .score()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "🔥 {score} Hochwählis\n📸 Pfosten von u/{}\n🔗 Verknüpfung im Internetz unter {link}",
        post.author()
    )
}

pub struct GraphPublisher {
    http: HttpClient,
    graph_url: String,
    account_id: String,
    access_token: String,
    hashtags: Vec<String>,
    hashtag_count: usize,
}

impl GraphPublisher {
    pub fn new(
        http: HttpClient,
        graph_url: impl Into<String>,
        account_id: impl Into<String>,
        access_token: impl Into<String>,
        hashtags: Vec<String>,
        hashtag_count: usize,
    ) -> Self {
        Self {
            http,
            graph_url: graph_url.into().trim_end_matches('/').to_string(),
            account_id: account_id.into(),
            access_token: access_token.into(),
            hashtags,
            hashtag_count,
        }
    }

    fn post_for_id(
        &self,
        step: &'static str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}", self.graph_url, path);
        let mut query = vec![("access_token", self.access_token.as_str())];
        query.extend_from_slice(params);
        let body = self
            .http
            .post_query(&url, &query)
            .map_err(|source| PublishError::Request { step, source })?;
        parse_id_response(&body).ok_or(PublishError::MissingId { step, body })
    }
}

impl Publisher for GraphPublisher {
    fn publish(&self, post: &FinalizedCandidate) -> Result<PublishReceipt, PublishError> {
        let ImageRef::Url(image_url) = post.image_ref() else {
            return Err(PublishError::NotAUrl(post.image_ref().to_string()));
        };
        let candidate = post.candidate().id.as_str();

        let caption = compose_caption(
            post.title(),
            &self.hashtags,
            self.hashtag_count,
            &mut rand::rng(),
        );
        tracing::debug!(candidate, %caption, "generated caption");

        let container_id = self.post_for_id(
            "create container",
            &format!("{}/media", self.account_id),
            &[("image_url", image_url.as_str()), ("caption", caption.as_str())],
        )?;
        tracing::info!(candidate, container = %container_id, "created media container");

        let media_id = self.post_for_id(
            "publish container",
            &format!("{}/media_publish", self.account_id),
            &[("creation_id", container_id.as_str())],
        )?;
        tracing::info!(candidate, media = %media_id, "published media");

        let comment = attribution_comment(post);
        let comment_id = self.post_for_id(
            "comment",
            &format!("{media_id}/comments"),
            &[("message", comment.as_str())],
        )?;
        tracing::info!(candidate, comment = %comment_id, "added attribution comment");

        Ok(PublishReceipt {
            media_id: Some(media_id),
            comment_id: Some(comment_id),
        })
    }
}

#[derive(Deserialize)]
struct IdResponse {
    id: Option<String>,
}

/// `id` field of a graph response, if present.
pub fn parse_id_response(body: &str) -> Option<String> {
    serde_json::from_str::<IdResponse>(body).ok()?.id
}

/// Publisher that only logs the post it was given.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, post: &FinalizedCandidate) -> Result<PublishReceipt, PublishError> {
        let (width, height) = post.dimensions();
        tracing::info!(
            candidate = %post.candidate().id,
            title = post.title(),
            image = %post.image_ref(),
            width,
            height,
            "dry run: not publishing"
        );
        Ok(PublishReceipt::default())
    }
}
