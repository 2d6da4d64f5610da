//! Tracing setup: human-readable lines on stdout plus a dated log file.
//!
//! The file lives at `<dir>/<YYYY>/<Month>/<DDMMYYYY>.log`. [`DatedLogFile`]
//! checks the local date on every write and switches to a new file when the
//! day changes, so a process running for weeks still logs one file per day.

use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },
    #[error("logging already initialised: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Path of the log file for `date` under `dir`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(date.format("%Y").to_string())
        .join(date.format("%B").to_string())
        .join(date.format("%d%m%Y.log").to_string())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Log file writer that follows the calendar day.
pub struct DatedLogFile {
    dir: PathBuf,
    clock: Clock,
    current: Mutex<Option<(NaiveDate, File)>>,
}

impl DatedLogFile {
    /// Rotate on the local calendar date.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, || Local::now().date_naive())
    }

    pub fn with_clock(
        dir: impl Into<PathBuf>,
        clock: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        Self {
            dir: dir.into(),
            clock: Box::new(clock),
            current: Mutex::new(None),
        }
    }

    /// Open today's file now so an unwritable directory fails at startup.
    pub fn open_today(&self) -> Result<PathBuf, LoggingError> {
        let today = (self.clock)();
        let path = log_file_path(&self.dir, today);
        let file = open_log_file(&path).map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;
        if let Ok(mut current) = self.current.lock() {
            *current = Some((today, file));
        }
        Ok(path)
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Option<(NaiveDate, File)>>> {
        self.current
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

/// One event's worth of writes against a [`DatedLogFile`].
pub struct DatedLogWriter<'a> {
    log: &'a DatedLogFile,
}

impl Write for DatedLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let today = (self.log.clock)();
        let mut current = self.log.lock()?;
        let stale = !matches!(&*current, Some((date, _)) if *date == today);
        if stale {
            let file = open_log_file(&log_file_path(&self.log.dir, today))?;
            *current = Some((today, file));
        }
        match current.as_mut() {
            Some((_, file)) => file.write(buf),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.log.lock()?.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for DatedLogFile {
    type Writer = DatedLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        DatedLogWriter { log: self }
    }
}

/// Install the global subscriber. Returns today's log file.
///
/// `RUST_LOG` overrides `filter` when set.
pub fn init(dir: &Path, filter: &str) -> Result<PathBuf, LoggingError> {
    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(from_env) if !from_env.trim().is_empty() => EnvFilter::try_new(&from_env),
        _ => EnvFilter::try_new(filter),
    }
    .map_err(|e| LoggingError::Filter {
        filter: filter.to_string(),
        message: e.to_string(),
    })?;

    let log_file = DatedLogFile::new(dir);
    let path = log_file.open_today()?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_file),
        )
        .try_init()?;

    tracing::info!(file = %path.display(), "logger initialized");
    Ok(path)
}
