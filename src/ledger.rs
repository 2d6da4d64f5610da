//! Persisted set of candidate ids that have already been selected.
//!
//! # Storage
//!
//! [`FileLedger`] keeps the whole set in memory and mirrors it to a flat file
//! with one id per line. Recording an id appends a single line and syncs the
//! file before returning, so an id that `record` reported as committed
//! survives a crash or restart. Line order carries no meaning and duplicate
//! lines are harmless; blank lines are skipped on load.
//!
//! A missing file is an empty ledger (first run), not an error.
//!
//! # Concurrency
//!
//! `record` takes `&mut self`, so the check-then-write in
//! [`select_next`](crate::select::select_next) is exclusive by construction.
//! Sharing one ledger between threads requires wrapping it in a `Mutex` held
//! across the whole select call, not just around `record`.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("id {0:?} cannot be stored in a line-based ledger")]
    InvalidId(String),
}

/// Set of already-selected candidate ids.
///
/// `record` must be idempotent: recording an id twice leaves the same
/// observable state as recording it once.
pub trait SeenLedger {
    fn contains(&self, id: &str) -> bool;

    fn record(&mut self, id: &str) -> Result<(), LedgerError>;
}

/// Ledger backed by an append-only, newline-delimited file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl FileLedger {
    /// Load the ledger at `path`. A missing file yields an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(LedgerError::Read { path, source }),
        };
        let ids = parse_ids(&content);
        tracing::debug!(path = %path.display(), entries = ids.len(), "loaded seen ledger");
        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn append_line(&self, id: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{id}")?;
        file.sync_data()
    }
}

impl SeenLedger for FileLedger {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn record(&mut self, id: &str) -> Result<(), LedgerError> {
        validate_id(id)?;
        if self.ids.contains(id) {
            return Ok(());
        }
        self.append_line(id).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.ids.insert(id.to_string());
        Ok(())
    }
}

/// Non-persistent ledger, for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    ids: HashSet<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl SeenLedger for MemoryLedger {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn record(&mut self, id: &str) -> Result<(), LedgerError> {
        validate_id(id)?;
        self.ids.insert(id.to_string());
        Ok(())
    }
}

fn validate_id(id: &str) -> Result<(), LedgerError> {
    if id.trim().is_empty() || id.contains(['\n', '\r']) {
        return Err(LedgerError::InvalidId(id.to_string()));
    }
    Ok(())
}

fn parse_ids(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
