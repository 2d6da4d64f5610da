//! Bot configuration module.
//!
//! Handles loading, validating, and merging `feedpost.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top of it,
//! so a config file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [feed]
//! base_url = "https://www.reddit.com/r/ich_iel"
//! limit = 100               # Top items inspected per run (1-100)
//! user_agent = "Mozilla/5.0 ..."
//!
//! [ledger]
//! path = "posts"            # Newline-delimited ids already handled
//!
//! [images]
//! quality = 90              # JPEG quality for padded images (1-100)
//!
//! [host]
//! kind = "imgur"            # "imgur" or "local"
//! endpoint = "https://api.imgur.com/3/image"
//! client_id = ""
//! output_dir = "out"        # Used when kind = "local"
//!
//! [publisher]
//! graph_url = "https://graph.facebook.com/v14.0"
//! account_id = ""
//! access_token = ""
//! hashtags_file = "hashtags"
//! hashtag_count = 10
//! dry_run = false
//!
//! [schedule]
//! poll_secs = 30
//! slots = [{ at = "11:00", posts = 1 }, ...]
//!
//! [logging]
//! dir = "logs"
//! filter = "feedpost=info"
//!
//! [http]
//! timeout_secs = 30
//! ```
//!
//! Unknown keys are rejected to catch typos early. Arrays (`schedule.slots`)
//! replace the default wholesale rather than merging element by element.

use crate::http::DEFAULT_USER_AGENT;
use crate::imaging::Quality;
use crate::schedule::Slot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "feedpost.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Bot configuration loaded from `feedpost.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub ledger: LedgerConfig,
    pub images: ImagesConfig,
    pub host: HostConfig,
    pub publisher: PublisherConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.feed.limit) {
            return Err(ConfigError::Validation("feed.limit must be 1-100".into()));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "feed.user_agent must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.schedule.poll_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.poll_secs must be non-zero".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be non-zero".into(),
            ));
        }
        self.slots()?;
        Ok(())
    }

    /// Parsed schedule slots.
    pub fn slots(&self) -> Result<Vec<Slot>, ConfigError> {
        self.schedule
            .slots
            .iter()
            .map(|s| {
                Slot::parse(&s.at, s.posts)
                    .map_err(|e| ConfigError::Validation(format!("schedule.slots: {e}")))
            })
            .collect()
    }

    /// Settings that must be filled in before posting for real.
    ///
    /// Empty when the configured host and publisher have what they need.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.kind == HostKind::Imgur && self.host.client_id.trim().is_empty() {
            missing.push("host.client_id");
        }
        if !self.publisher.dry_run {
            if self.publisher.account_id.trim().is_empty() {
                missing.push("publisher.account_id");
            }
            if self.publisher.access_token.trim().is_empty() {
                missing.push("publisher.access_token");
            }
        }
        missing
    }

    /// Whether posts go to the graph API or only to the log.
    ///
    /// A local host produces file paths the graph API cannot fetch, so it
    /// always implies a dry run.
    pub fn publishes(&self) -> bool {
        !self.publisher.dry_run && self.host.kind != HostKind::Local
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Community listing URL; `/top.json` is appended.
    pub base_url: String,
    /// How many top items to inspect.
    pub limit: usize,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com/r/ich_iel".to_string(),
            limit: 100,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("posts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality for padded images (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl ImagesConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    #[default]
    Imgur,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub kind: HostKind,
    /// Upload endpoint (imgur only).
    pub endpoint: String,
    /// Application client id sent as `Client-ID` (imgur only).
    pub client_id: String,
    /// Directory padded images are written to (local only).
    pub output_dir: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            kind: HostKind::Imgur,
            endpoint: "https://api.imgur.com/3/image".to_string(),
            client_id: String::new(),
            output_dir: PathBuf::from("out"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    pub graph_url: String,
    pub account_id: String,
    pub access_token: String,
    /// One hashtag per line.
    pub hashtags_file: PathBuf,
    pub hashtag_count: usize,
    /// Log posts instead of publishing them.
    pub dry_run: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            graph_url: "https://graph.facebook.com/v14.0".to_string(),
            account_id: String::new(),
            access_token: String::new(),
            hashtags_file: PathBuf::from("hashtags"),
            hashtag_count: 10,
            dry_run: false,
        }
    }
}

/// One `[[schedule.slots]]` entry as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    /// Local time, `HH:MM`.
    pub at: String,
    pub posts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub poll_secs: u64,
    pub slots: Vec<SlotConfig>,
}

const DEFAULT_SLOTS: &[(&str, u32)] = &[
    ("11:00", 1),
    ("12:00", 1),
    ("13:00", 2),
    ("13:30", 2),
    ("14:00", 2),
    ("14:30", 2),
    ("15:00", 2),
    ("15:30", 2),
    ("16:00", 1),
    ("16:30", 1),
    ("17:00", 1),
    ("17:30", 1),
    ("18:00", 1),
    ("19:00", 1),
    ("20:00", 1),
    ("21:00", 1),
    ("22:00", 1),
];

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_secs: 30,
            slots: DEFAULT_SLOTS
                .iter()
                .map(|(at, posts)| SlotConfig {
                    at: at.to_string(),
                    posts: *posts,
                })
                .collect(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            filter: "feedpost=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `feedpost.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# feedpost configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Feed
# ---------------------------------------------------------------------------
[feed]
# Community listing; "/top.json?limit=N" is appended.
base_url = "https://www.reddit.com/r/ich_iel"

# How many top items to inspect per run (1-100).
limit = 100

# Sent with every HTTP request.
user_agent = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.0.0 Safari/537.36"

# ---------------------------------------------------------------------------
# Seen ledger
# ---------------------------------------------------------------------------
[ledger]
# One candidate id per line. Ids are appended before anything is posted.
path = "posts"

# ---------------------------------------------------------------------------
# Image normalization
# ---------------------------------------------------------------------------
[images]
# JPEG quality used when re-encoding padded images (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Image hosting for padded images
# ---------------------------------------------------------------------------
[host]
# "imgur" uploads anonymously; "local" writes files and implies a dry run.
kind = "imgur"
endpoint = "https://api.imgur.com/3/image"
client_id = ""
output_dir = "out"

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publisher]
graph_url = "https://graph.facebook.com/v14.0"
account_id = ""
access_token = ""

# Hashtags, one per line; hashtag_count of them are picked per post.
hashtags_file = "hashtags"
hashtag_count = 10

# Log what would be posted instead of posting it.
dry_run = false

# ---------------------------------------------------------------------------
# Daily schedule (local time)
# ---------------------------------------------------------------------------
[schedule]
# Seconds between clock checks.
poll_secs = 30

# Each slot runs `posts` invocations when its time is reached.
slots = [
    { at = "11:00", posts = 1 },
    { at = "12:00", posts = 1 },
    { at = "13:00", posts = 2 },
    { at = "13:30", posts = 2 },
    { at = "14:00", posts = 2 },
    { at = "14:30", posts = 2 },
    { at = "15:00", posts = 2 },
    { at = "15:30", posts = 2 },
    { at = "16:00", posts = 1 },
    { at = "16:30", posts = 1 },
    { at = "17:00", posts = 1 },
    { at = "17:30", posts = 1 },
    { at = "18:00", posts = 1 },
    { at = "19:00", posts = 1 },
    { at = "20:00", posts = 1 },
    { at = "21:00", posts = 1 },
    { at = "22:00", posts = 1 },
]

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Log files go to <dir>/<YYYY>/<Month>/<DDMMYYYY>.log
dir = "logs"
filter = "feedpost=info"

# ---------------------------------------------------------------------------
# HTTP
# ---------------------------------------------------------------------------
[http]
timeout_secs = 30
"##
}
