//! Shared test utilities for the feedpost test suite.
//!
//! Provides a candidate builder, synthetic image encoding, and fake
//! collaborators (feed, fetcher, host, publisher) that record what they were
//! asked to do.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let feed = StaticFeed::new(vec![candidate("a"), candidate("b")]);
//! let host = RecordingHost::new();
//! // hand `host.clone()` to the pipeline, then inspect `host.uploads()`
//! ```

use crate::feed::FeedClient;
use crate::host::{HostError, ImageHost};
use crate::http::{FetchError, ImageFetcher};
use crate::publish::{PublishError, PublishReceipt, Publisher};
use crate::types::{Candidate, FinalizedCandidate, ImageRef};
use chrono::{TimeZone, Utc};
use image::{ImageFormat, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// =========================================================================
// Builders
// =========================================================================

/// A safe, unseen-looking candidate with a PNG image URL.
pub fn candidate(id: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: format!("title {id}"),
        source_url: format!("https://redd.it/{id}"),
        image_url: format!("https://i.example/{id}.png"),
        author: "poster".to_string(),
        popularity: Some(100),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        is_adult: false,
        is_video: false,
    }
}

/// Encode a gradient image of the given size.
pub fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

// =========================================================================
// Feeds
// =========================================================================

/// Feed that always returns the same candidates and remembers each `limit`.
pub struct StaticFeed {
    candidates: Vec<Candidate>,
    limits: Mutex<Vec<usize>>,
}

impl StaticFeed {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            limits: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

impl FeedClient for StaticFeed {
    fn fetch_ranked(&self, limit: usize) -> Result<Vec<Candidate>, FetchError> {
        self.limits.lock().unwrap().push(limit);
        Ok(self.candidates.clone())
    }
}

/// Feed whose every fetch fails like a network outage.
pub struct FailingFeed;

impl FeedClient for FailingFeed {
    fn fetch_ranked(&self, _limit: usize) -> Result<Vec<Candidate>, FetchError> {
        Err(FetchError::Status {
            status: 503,
            url: "https://feed.example/top.json".to_string(),
            body: "unavailable".to_string(),
        })
    }
}

// =========================================================================
// Fetcher, host, publisher
// =========================================================================

/// Serves image bytes from a URL map; unknown URLs are a 404.
#[derive(Default)]
pub struct MapFetcher {
    images: HashMap<String, Vec<u8>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

impl ImageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
                body: String::new(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub key: String,
}

/// Host that keeps uploads in memory and returns `https://host.example/<key>`.
#[derive(Clone, Default)]
pub struct RecordingHost {
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl ImageHost for RecordingHost {
    fn upload(&self, bytes: &[u8], mime_type: &str, key: &str) -> Result<ImageRef, HostError> {
        self.uploads.lock().unwrap().push(Upload {
            bytes: bytes.to_vec(),
            mime_type: mime_type.to_string(),
            key: key.to_string(),
        });
        Ok(ImageRef::Url(format!("https://host.example/{key}")))
    }
}

/// Publisher that records candidate ids, or fails every call.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published_ids(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, post: &FinalizedCandidate) -> Result<PublishReceipt, PublishError> {
        if self.fail {
            return Err(PublishError::MissingId {
                step: "create container",
                body: r#"{"error": {"message": "token expired"}}"#.to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push(post.candidate().id.clone());
        Ok(PublishReceipt {
            media_id: Some(format!("media-{}", post.candidate().id)),
            comment_id: None,
        })
    }
}
