//! Per-request instrumentation log.
//!
//! Handlers bracket their work with [`RequestLogger::start_timing`] and
//! [`RequestLogger::end_timing`] (or hold a [`RequestScope`], which does both)
//! and call [`RequestLogger::log`] any number of times in between. Every call
//! produces one fixed-width line appended to `<base>/<module>/<module>.log`
//! and to the central `sistema_completo.log`.
//!
//! Writes are synchronous so a line is on disk when `log` returns. Inside a
//! multi-threaded tokio runtime they run under `block_in_place`, which moves
//! the worker's other tasks elsewhere while the append blocks.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use http::StatusCode;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};

use super::context::{RequestContext, RequestId};
use super::metrics::get_metrics;
use crate::config::RequestLogSettings;

/// Name of the file that aggregates every module's entries.
pub const CENTRAL_LOG_FILE: &str = "sistema_completo.log";

/// Client IP reported for entries written outside any HTTP request.
pub const IP_NO_CONTEXT: &str = "UNKNOWN";

/// Method reported for entries written outside any HTTP request.
pub const METHOD_NO_CONTEXT: &str = "CLI";

pub const DEFAULT_STATUS: u16 = 200;

/// Transaction ids are clock microseconds reduced into this range.
const TX_ID_RANGE: u64 = 1_000_000_000;

/// Severity of a request log entry.
///
/// Anything other than the three known levels is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Other(String),
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Other(s) => s,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s {
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            other => LogLevel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One immutable line of the request log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub transaction_id: String,
    pub module: String,
    pub client_ip: String,
    pub method: String,
    pub uri: String,
    pub status: u16,
    pub elapsed: Option<Duration>,
    pub message: String,
}

impl LogEntry {
    /// Timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn timestamp_str(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// The full newline-terminated line as written to disk.
    pub fn format_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{:5}] [{}] [{:12}] [IP:{:15}] [{:6} {:40}] [Status:{}]",
            self.timestamp_str(),
            self.level,
            self.transaction_id,
            self.module,
            self.client_ip,
            self.method,
            self.uri,
            self.status,
        )?;
        if let Some(elapsed) = self.elapsed {
            write!(f, " [{:.2}ms]", elapsed.as_secs_f64() * 1000.0)?;
        }
        write!(f, " {}", self.message)
    }
}

/// In-flight request start instants, keyed by server-generated request id.
#[derive(Debug, Default)]
pub struct TimingRegistry {
    entries: DashMap<RequestId, Instant>,
}

impl TimingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start instant, replacing any earlier one for the same id.
    pub fn start(&self, id: &RequestId) {
        self.entries.insert(id.clone(), Instant::now());
    }

    pub fn elapsed(&self, id: &RequestId) -> Option<Duration> {
        self.entries.get(id).map(|start| start.elapsed())
    }

    /// Removes the entry; returns false if there was none.
    pub fn end(&self, id: &RequestId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Issues `TX-<n>` ids from the wall clock in microseconds modulo 10^9.
///
/// Within one process the counter never repeats a value until the range
/// wraps: a reading that is not ahead of the last issued id is bumped by one.
#[derive(Debug, Default)]
pub struct TransactionIdGenerator {
    last: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64 % TX_ID_RANGE)
            .unwrap_or(0);

        let advance = |prev: u64| {
            // A reading far behind the last id means the clock wrapped the range.
            if now > prev || prev - now > TX_ID_RANGE / 2 {
                now
            } else {
                (prev + 1) % TX_ID_RANGE
            }
        };

        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| Some(advance(prev)))
            .unwrap_or_else(|prev| prev);

        format!("TX-{}", advance(prev))
    }
}

#[derive(Debug, Error)]
pub enum LogWriteError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for formatted request log lines.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Appends a line to the module's own log.
    fn append_module(&self, module: &str, line: &str) -> Result<(), LogWriteError>;

    /// Appends a line to the log shared by every module.
    fn append_central(&self, line: &str) -> Result<(), LogWriteError>;
}

/// Writes lines under a base directory, one subdirectory per module.
#[derive(Debug)]
pub struct FileLogSink {
    base_dir: PathBuf,
    central_file: String,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl FileLogSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_central_file(base_dir, CENTRAL_LOG_FILE)
    }

    pub fn with_central_file(base_dir: impl Into<PathBuf>, central_file: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            central_file: central_file.into(),
            locks: DashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn module_path(&self, module: &str) -> PathBuf {
        let dir = module_dir_name(module);
        self.base_dir.join(&dir).join(format!("{}.log", dir))
    }

    pub fn central_path(&self) -> PathBuf {
        self.base_dir.join(&self.central_file)
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn append_to(&self, path: &Path, line: &str) -> Result<(), LogWriteError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LogWriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let append_err = |source| LogWriteError::Append {
            path: path.to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(append_err)?;
        // One write per line keeps appends from other processes whole.
        file.write_all(line.as_bytes()).map_err(append_err)
    }
}

impl LogSink for FileLogSink {
    fn append_module(&self, module: &str, line: &str) -> Result<(), LogWriteError> {
        self.append_to(&self.module_path(module), line)
    }

    fn append_central(&self, line: &str) -> Result<(), LogWriteError> {
        self.append_to(&self.central_path(), line)
    }
}

/// Directory name for a module, restricted to one safe path component.
fn module_dir_name(module: &str) -> String {
    let cleaned: String = module
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "general".to_string()
    } else {
        cleaned
    }
}

/// Runs blocking file I/O, handing off the current tokio worker's tasks first
/// when called from a multi-threaded runtime.
fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// The request instrumentation log shared by all handlers.
pub struct RequestLogger {
    registry: TimingRegistry,
    tx_ids: TransactionIdGenerator,
    sink: Arc<dyn LogSink>,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry: TimingRegistry::new(),
            tx_ids: TransactionIdGenerator::new(),
            sink,
        }
    }

    pub fn from_settings(settings: &RequestLogSettings) -> Self {
        Self::new(Arc::new(FileLogSink::with_central_file(
            settings.base_dir.clone(),
            settings.central_file.clone(),
        )))
    }

    pub fn start_timing(&self, id: &RequestId) {
        self.registry.start(id);
        get_metrics().set_inflight_requests(self.registry.len());
    }

    pub fn end_timing(&self, id: &RequestId) {
        self.registry.end(id);
        get_metrics().set_inflight_requests(self.registry.len());
    }

    /// Number of requests currently being timed.
    pub fn inflight(&self) -> usize {
        self.registry.len()
    }

    /// Writes one entry. Never fails from the caller's point of view.
    pub fn log(
        &self,
        context: Option<&RequestContext>,
        module: &str,
        level: impl Into<LogLevel>,
        message: impl AsRef<str>,
    ) {
        let entry = self.build_entry(context, module, level.into(), message.as_ref());
        self.write(&entry);
    }

    /// Resolves every field of an entry, defaulting whatever the context lacks.
    pub fn build_entry(
        &self,
        context: Option<&RequestContext>,
        module: &str,
        level: LogLevel,
        message: &str,
    ) -> LogEntry {
        let (client_ip, method, uri, status, elapsed) = match context {
            Some(ctx) => (
                ctx.client_ip(),
                ctx.method().to_string(),
                ctx.path().to_string(),
                ctx.status().map(|s| s.as_u16()).unwrap_or(DEFAULT_STATUS),
                self.registry.elapsed(ctx.request_id()),
            ),
            None => (
                IP_NO_CONTEXT.to_string(),
                METHOD_NO_CONTEXT.to_string(),
                "/".to_string(),
                DEFAULT_STATUS,
                None,
            ),
        };

        LogEntry {
            timestamp: Utc::now(),
            level,
            transaction_id: self.tx_ids.next_id(),
            module: module.to_string(),
            client_ip,
            method,
            uri,
            status,
            elapsed,
            message: message.to_string(),
        }
    }

    fn write(&self, entry: &LogEntry) {
        let line = entry.format_line();
        // Both destinations are attempted even if the first one fails.
        let results = run_blocking(|| {
            [
                self.sink.append_module(&entry.module, &line),
                self.sink.append_central(&line),
            ]
        });
        for err in results.into_iter().filter_map(Result::err) {
            tracing::warn!(module = %entry.module, error = %err, "Dropped request log entry");
            get_metrics().record_log_write_failure(&entry.module);
        }
    }

    /// Starts timing the request and returns a guard that logs under `module`
    /// and ends the timing when dropped.
    pub fn scope<'a>(&'a self, context: &RequestContext, module: &'a str) -> RequestScope<'a> {
        self.start_timing(context.request_id());
        RequestScope {
            logger: self,
            context: context.clone(),
            module,
        }
    }
}

/// Logging handle for one request inside one module.
pub struct RequestScope<'a> {
    logger: &'a RequestLogger,
    context: RequestContext,
    module: &'a str,
}

impl<'a> RequestScope<'a> {
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Records the response status reported by subsequent lines.
    pub fn set_status(&mut self, status: StatusCode) {
        self.context.set_status(status);
    }

    pub fn log(&self, level: impl Into<LogLevel>, message: impl AsRef<str>) {
        self.logger.log(Some(&self.context), self.module, level, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }
}

impl Drop for RequestScope<'_> {
    fn drop(&mut self) {
        self.logger.end_timing(self.context.request_id());
    }
}
