//! # feedpost
//!
//! A scheduled bot that reposts the top image of a community feed to a
//! photo-sharing account. Each invocation picks the highest-ranked post that
//! is safe for work, not a video, and not posted before; fixes its aspect
//! ratio if the platform would reject it; and publishes it with a caption and
//! an attribution comment.
//!
//! # Architecture: One Invocation
//!
//! ```text
//! 1. Select     feed top N  →  Candidate        (ledger updated before return)
//! 2. Download   image_url   →  ImageBuffer
//! 3. Normalize  ImageBuffer →  padded bytes     (only outside 0.8..=1.9)
//! 4. Host       bytes       →  public URL       (only when padded)
//! 5. Publish    URL + text  →  PublishReceipt
//! ```
//!
//! Every stage talks to the outside world through a trait ([`feed::FeedClient`],
//! [`ledger::SeenLedger`], [`http::ImageFetcher`], [`imaging::ImageBackend`],
//! [`host::ImageHost`], [`publish::Publisher`]), so the whole pipeline runs in
//! tests against in-memory fakes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`select`] | Picks the first eligible candidate and records it |
//! | [`ledger`] | Append-only set of handled ids, persisted one per line |
//! | [`feed`] | Ranked listing client and JSON parsing |
//! | [`imaging`] | Aspect-ratio decision, canvas geometry, padding backend |
//! | [`host`] | Uploads padded images (imgur or a local directory) |
//! | [`publish`] | Caption, attribution, and the graph-API publish sequence |
//! | [`pipeline`] | Wires the stages together and classifies failures |
//! | [`schedule`] | Daily slot timetable and the polling loop |
//! | [`config`] | `feedpost.toml` loading, merging, and validation |
//! | [`logging`] | `tracing` subscriber with stdout and a dated log file |
//! | [`http`] | Blocking HTTP client shared by every remote collaborator |
//! | [`types`] | `Candidate`, `FinalizedCandidate`, `ImageRef` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Record Before Publish
//!
//! A candidate's id is written to the ledger (and synced) before any network
//! work on its image starts. A crash or a failed upload therefore loses one
//! post rather than risking the same post twice. There is no retry of an
//! aborted candidate and no fallback to the next one in the same invocation.
//!
//! ## Pad, Never Crop
//!
//! Images outside the accepted ratio band are centered on a white canvas
//! widened (portrait) or heightened (landscape) to a ratio just inside the
//! band. Nothing of the original is cut off, and the re-encode keeps the
//! source's format.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, padding, and encoding use the `image` crate only, so the binary
//! has no system image-library dependency.

pub mod config;
pub mod feed;
pub mod host;
pub mod http;
pub mod imaging;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod schedule;
pub mod select;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
