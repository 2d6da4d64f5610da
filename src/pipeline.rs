//! One end-to-end invocation: select → download → normalize → host → publish.
//!
//! Collaborators are injected as trait objects through [`Collaborators`], so
//! tests and dry runs can swap any of them.
//!
//! # Failure handling
//!
//! | Failure | Effect |
//! |---|---|
//! | Feed unreachable or malformed | [`RunOutcome::NoCandidate`] |
//! | Ledger unwritable | `Err(PipelineError::Ledger)`, the only error returned |
//! | Download, decode, upload, publish | [`RunOutcome::Aborted`]; the id stays recorded |
//!
//! An aborted candidate is not replaced by the next one in the feed during
//! the same invocation. The slot is simply lost.

use crate::feed::FeedClient;
use crate::host::{HostError, ImageHost};
use crate::http::{FetchError, ImageFetcher};
use crate::imaging::{AspectDecision, ImageBackend, ImageBuffer, NormalizeError, Quality};
use crate::imaging::{normalize, resolve_format};
use crate::ledger::{LedgerError, SeenLedger};
use crate::publish::{PublishError, PublishReceipt, Publisher};
use crate::select::select_next;
use crate::types::{Candidate, FinalizedCandidate, ImageRef};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Why a selected candidate did not get published.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("image download failed: {0}")]
    Download(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("image hosting failed: {0}")]
    Host(#[from] HostError),
    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
}

impl StageError {
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Download(_) => "download",
            StageError::Normalize(_) => "normalize",
            StageError::Host(_) => "host",
            StageError::Publish(_) => "publish",
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing eligible in the feed window, or the feed could not be read.
    NoCandidate,
    Published {
        post: FinalizedCandidate,
        receipt: PublishReceipt,
    },
    Aborted {
        candidate: Candidate,
        error: StageError,
    },
}

pub struct Collaborators {
    pub feed: Box<dyn FeedClient>,
    pub ledger: Box<dyn SeenLedger>,
    pub fetcher: Box<dyn ImageFetcher>,
    pub backend: Box<dyn ImageBackend>,
    pub host: Box<dyn ImageHost>,
    pub publisher: Box<dyn Publisher>,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// How many top feed items to inspect.
    pub feed_limit: usize,
    pub quality: Quality,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            feed_limit: 100,
            quality: Quality::default(),
        }
    }
}

pub struct Pipeline {
    parts: Collaborators,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(parts: Collaborators, settings: PipelineSettings) -> Self {
        Self { parts, settings }
    }

    /// Run one invocation.
    pub fn run_once(&mut self) -> Result<RunOutcome, PipelineError> {
        let Some(candidate) = select_next(
            &*self.parts.feed,
            &mut *self.parts.ledger,
            self.settings.feed_limit,
        )?
        else {
            return Ok(RunOutcome::NoCandidate);
        };

        match self.finalize_and_publish(&candidate) {
            Ok((post, receipt)) => {
                tracing::info!(
                    candidate = %candidate.id,
                    title = %candidate.title,
                    image = %post.image_ref(),
                    author = %candidate.author,
                    score = ?candidate.popularity,
                    created_at = %candidate.created_at,
                    "posted candidate"
                );
                Ok(RunOutcome::Published { post, receipt })
            }
            Err(error) => {
                tracing::error!(
                    operation = error.stage(),
                    candidate = %candidate.id,
                    %error,
                    "candidate aborted"
                );
                Ok(RunOutcome::Aborted { candidate, error })
            }
        }
    }

    /// Run `count` invocations back to back.
    ///
    /// Stops at the first ledger failure; outcomes gathered so far are lost
    /// with it, but each was already logged.
    pub fn run(&mut self, count: u32) -> Result<Vec<RunOutcome>, PipelineError> {
        (0..count).map(|_| self.run_once()).collect()
    }

    fn finalize_and_publish(
        &self,
        candidate: &Candidate,
    ) -> Result<(FinalizedCandidate, PublishReceipt), StageError> {
        let parts = &self.parts;

        let bytes = parts.fetcher.fetch(&candidate.image_url)?;
        let format = resolve_format(&*parts.backend, &candidate.image_url, &bytes)?;
        let image = ImageBuffer::load(&*parts.backend, bytes, &format)?;
        tracing::info!(
            candidate = %candidate.id,
            width = image.width,
            height = image.height,
            format = %image.format,
            "downloaded image"
        );

        let (image_ref, dims) = match image.decision() {
            AspectDecision::Accepted => (
                ImageRef::Url(candidate.image_url.clone()),
                image.dimensions(),
            ),
            AspectDecision::Resize { .. } => {
                let padded = normalize(&*parts.backend, image, self.settings.quality)?;
                let image_ref =
                    parts
                        .host
                        .upload(&padded.bytes, &padded.mime_type(), &candidate.id)?;
                (image_ref, padded.dimensions())
            }
        };

        let post = FinalizedCandidate::new(candidate.clone(), image_ref, dims);
        let receipt = parts.publisher.publish(&post)?;
        Ok((post, receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::ledger::MemoryLedger;
    use crate::test_helpers::{
        FailingFeed, MapFetcher, RecordingHost, RecordingPublisher, StaticFeed, candidate,
        encode_test_image,
    };
    use image::ImageFormat;

    fn pipeline_with(
        feed: Box<dyn FeedClient>,
        ledger: MemoryLedger,
        fetcher: MapFetcher,
        host: RecordingHost,
        publisher: RecordingPublisher,
    ) -> Pipeline {
        Pipeline::new(
            Collaborators {
                feed,
                ledger: Box::new(ledger),
                fetcher: Box::new(fetcher),
                backend: Box::new(RustBackend::new()),
                host: Box::new(host),
                publisher: Box::new(publisher),
            },
            PipelineSettings::default(),
        )
    }

    fn image_candidate(id: &str, ext: &str) -> Candidate {
        let mut c = candidate(id);
        c.image_url = format!("https://img.example/{id}.{ext}");
        c
    }

    #[test]
    fn accepted_image_is_published_from_source_url() {
        let c = image_candidate("ok", "png");
        let fetcher = MapFetcher::new().with(&c.image_url, encode_test_image(400, 300, ImageFormat::Png));
        let host = RecordingHost::new();
        let publisher = RecordingPublisher::new();
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![c.clone()])),
            MemoryLedger::new(),
            fetcher,
            host.clone(),
            publisher.clone(),
        );

        let outcome = pipeline.run_once().unwrap();

        let RunOutcome::Published { post, .. } = outcome else {
            panic!("expected Published, got {outcome:?}");
        };
        assert_eq!(post.image_ref(), &ImageRef::Url(c.image_url.clone()));
        assert_eq!(post.dimensions(), (400, 300));
        assert!(host.uploads().is_empty());
        assert_eq!(publisher.published_ids(), vec!["ok"]);
    }

    #[test]
    fn tall_image_is_padded_and_uploaded() {
        let c = image_candidate("tall", "jpg");
        let fetcher =
            MapFetcher::new().with(&c.image_url, encode_test_image(300, 500, ImageFormat::Jpeg));
        let host = RecordingHost::new();
        let publisher = RecordingPublisher::new();
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![c])),
            MemoryLedger::new(),
            fetcher,
            host.clone(),
            publisher.clone(),
        );

        let outcome = pipeline.run_once().unwrap();

        let RunOutcome::Published { post, .. } = outcome else {
            panic!("expected Published, got {outcome:?}");
        };
        assert_eq!(post.dimensions(), (450, 500));
        let uploads = host.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].mime_type, "image/jpeg");
        assert_eq!(uploads[0].key, "tall");
        let (w, h) = image::load_from_memory(&uploads[0].bytes)
            .map(|img| (img.width(), img.height()))
            .unwrap();
        assert_eq!((w, h), (450, 500));
        assert_eq!(
            post.image_ref(),
            &ImageRef::Url("https://host.example/tall".into())
        );
    }

    #[test]
    fn undecodable_image_aborts_and_stays_recorded() {
        let bad = image_candidate("bad", "png");
        let next = image_candidate("next", "png");
        let fetcher = MapFetcher::new()
            .with(&bad.image_url, b"not an image".to_vec())
            .with(&next.image_url, encode_test_image(10, 10, ImageFormat::Png));
        let publisher = RecordingPublisher::new();
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![bad, next])),
            MemoryLedger::new(),
            fetcher,
            RecordingHost::new(),
            publisher.clone(),
        );

        let outcome = pipeline.run_once().unwrap();
        let RunOutcome::Aborted { candidate, error } = outcome else {
            panic!("expected Aborted, got {outcome:?}");
        };
        assert_eq!(candidate.id, "bad");
        assert_eq!(error.stage(), "normalize");
        assert!(publisher.published_ids().is_empty());

        // No fallback within the run; the next run moves on.
        let outcome = pipeline.run_once().unwrap();
        assert!(matches!(outcome, RunOutcome::Published { ref post, .. } if post.candidate().id == "next"));
    }

    #[test]
    fn download_failure_aborts() {
        let c = image_candidate("gone", "png");
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![c])),
            MemoryLedger::new(),
            MapFetcher::new(),
            RecordingHost::new(),
            RecordingPublisher::new(),
        );

        let outcome = pipeline.run_once().unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Aborted { ref error, .. } if error.stage() == "download"
        ));
    }

    #[test]
    fn publish_failure_aborts() {
        let c = image_candidate("p", "png");
        let fetcher = MapFetcher::new().with(&c.image_url, encode_test_image(10, 10, ImageFormat::Png));
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![c])),
            MemoryLedger::new(),
            fetcher,
            RecordingHost::new(),
            RecordingPublisher::failing(),
        );

        let outcome = pipeline.run_once().unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Aborted { ref error, .. } if error.stage() == "publish"
        ));
    }

    #[test]
    fn feed_failure_is_no_candidate() {
        let mut pipeline = pipeline_with(
            Box::new(FailingFeed),
            MemoryLedger::new(),
            MapFetcher::new(),
            RecordingHost::new(),
            RecordingPublisher::new(),
        );
        assert!(matches!(pipeline.run_once().unwrap(), RunOutcome::NoCandidate));
    }

    #[test]
    fn run_counts_invocations() {
        let a = image_candidate("a", "png");
        let b = image_candidate("b", "png");
        let fetcher = MapFetcher::new()
            .with(&a.image_url, encode_test_image(10, 10, ImageFormat::Png))
            .with(&b.image_url, encode_test_image(10, 10, ImageFormat::Png));
        let publisher = RecordingPublisher::new();
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![a, b])),
            MemoryLedger::new(),
            fetcher,
            RecordingHost::new(),
            publisher.clone(),
        );

        let outcomes = pipeline.run(3).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[2], RunOutcome::NoCandidate));
        assert_eq!(publisher.published_ids(), vec!["a", "b"]);
    }

    #[test]
    fn ledger_failure_is_fatal() {
        let mut pipeline = pipeline_with(
            Box::new(StaticFeed::new(vec![candidate("bad\nid")])),
            MemoryLedger::new(),
            MapFetcher::new(),
            RecordingHost::new(),
            RecordingPublisher::new(),
        );
        assert!(matches!(
            pipeline.run_once(),
            Err(PipelineError::Ledger(_))
        ));
    }
}
