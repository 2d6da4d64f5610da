//! Types shared between pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One feed submission, exactly as the feed reported it.
///
/// Immutable once read: later stages derive new values from it instead of
/// rewriting fields (the resolved image lives on [`FinalizedCandidate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Feed-assigned identifier, stable across fetches.
    pub id: String,
    pub title: String,
    /// Permalink back to the submission.
    pub source_url: String,
    /// Where the raster image is downloaded from.
    pub image_url: String,
    pub author: String,
    pub popularity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_adult: bool,
    pub is_video: bool,
}

impl Candidate {
    /// True unless the feed flagged the submission as adult or video.
    pub fn is_safe_image(&self) -> bool {
        !self.is_adult && !self.is_video
    }
}

/// Final location of the image handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRef {
    Url(String),
    Path(PathBuf),
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Url(url) => f.write_str(url),
            ImageRef::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A candidate whose image is ready to publish.
///
/// Fields are private so the value cannot change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedCandidate {
    candidate: Candidate,
    image_ref: ImageRef,
    width: u32,
    height: u32,
}

impl FinalizedCandidate {
    pub fn new(candidate: Candidate, image_ref: ImageRef, dimensions: (u32, u32)) -> Self {
        Self {
            candidate,
            image_ref,
            width: dimensions.0,
            height: dimensions.1,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn title(&self) -> &str {
        &self.candidate.title
    }

    pub fn author(&self) -> &str {
        &self.candidate.author
    }

    pub fn score(&self) -> Option<i64> {
        self.candidate.popularity
    }

    pub fn permalink(&self) -> &str {
        &self.candidate.source_url
    }

    pub fn image_ref(&self) -> &ImageRef {
        &self.image_ref
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
