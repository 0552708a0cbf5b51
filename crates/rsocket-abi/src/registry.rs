//! Process-wide binding registry.
//!
//! The table lives in a `OnceLock` that is set only after a complete load, so
//! readers never lock and never see a partial table. Load attempts are
//! serialized by a mutex around the resolver; a thread that loses the race
//! re-checks the `OnceLock` after acquiring it and returns the winner's table.

use std::ffi::{CStr, CString, c_void};
use std::ptr::NonNull;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rsocket_core::dlfcn as dlfcn_core;
use rsocket_core::{LoaderConfig, RsocketSymbol, SYMBOL_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::resolver::{DlResolver, SymbolResolver};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel};
use crate::table::RsocketTable;

/// Whether the table has been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    NotAttempted,
    Loaded,
}

/// Counters describing the work a registry has done.
#[derive(Debug, Default)]
pub struct LoadStats {
    opens: AtomicU64,
    lookups: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`LoadStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStatsSnapshot {
    /// Library open attempts.
    pub opens: u64,
    /// Symbol lookups, successful or not.
    pub lookups: u64,
    pub successes: u64,
    pub failures: u64,
}

impl LoadStats {
    #[must_use]
    pub fn snapshot(&self) -> LoadStatsSnapshot {
        LoadStatsSnapshot {
            opens: self.opens.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Exactly-once binding of the transport's entry points.
pub struct BindingRegistry<R: SymbolResolver> {
    resolver: Mutex<R>,
    table: OnceLock<RsocketTable>,
    config: LoaderConfig,
    stats: LoadStats,
    log: Option<Mutex<LogEmitter>>,
    log_error: Option<String>,
}

impl<R: SymbolResolver> BindingRegistry<R> {
    /// Create a registry. If `config.log_path` is set and can be opened, load
    /// events are appended to it; otherwise the open error is kept for
    /// [`log_open_error`](Self::log_open_error) and loading is unaffected.
    pub fn new(resolver: R, config: LoaderConfig) -> Self {
        let (log, log_error) = match config.log_path.as_deref() {
            None => (None, None),
            Some(path) => match LogEmitter::to_file(path) {
                Ok(emitter) => (Some(Mutex::new(emitter)), None),
                Err(err) => (None, Some(format!("{}: {err}", path.display()))),
            },
        };
        Self {
            resolver: Mutex::new(resolver),
            table: OnceLock::new(),
            config,
            stats: LoadStats::default(),
            log,
            log_error,
        }
    }

    /// Replace the log sink.
    #[must_use]
    pub fn with_log_emitter(mut self, emitter: LogEmitter) -> Self {
        self.log = Some(Mutex::new(emitter));
        self.log_error = None;
        self
    }

    /// Why the configured load log could not be opened, if it could not.
    #[must_use]
    pub fn log_open_error(&self) -> Option<&str> {
        self.log_error.as_deref()
    }

    /// Bind every entry point, or return the table bound earlier.
    ///
    /// Once this has succeeded it never touches the resolver again. A failure
    /// leaves the registry as it was; the next call retries from `dlopen`.
    pub fn ensure_loaded(&self) -> Result<&RsocketTable, LoadError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let mut resolver = self.resolver.lock();
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let table = self.load(&mut resolver)?;
        Ok(self.table.get_or_init(|| table))
    }

    /// The published table, if a load has succeeded.
    #[must_use]
    pub fn table(&self) -> Option<&RsocketTable> {
        self.table.get()
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        if self.table.get().is_some() {
            LoadState::Loaded
        } else {
            LoadState::NotAttempted
        }
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> LoadStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one load attempt. Caller holds the resolver lock.
    fn load(&self, resolver: &mut R) -> Result<RsocketTable, LoadError> {
        let started = Instant::now();
        let attempt = self.stats.opens.fetch_add(1, Ordering::Relaxed) + 1;
        let library = self.config.library.as_str();
        self.log(
            LogEntry::new("", LogLevel::Debug, "load_begin")
                .with_library(library)
                .with_attempt(attempt)
                .with_policy(self.config.on_failure.as_str()),
        );

        let c_library = match CString::new(library) {
            Ok(name) if dlfcn_core::valid_library_name(library) => name,
            _ => {
                return Err(self.fail(
                    attempt,
                    started,
                    LoadError::library(library, dlfcn_core::ERR_INVALID_NAME),
                ));
            }
        };

        // Every lookup goes through RTLD_DEFAULT, which only sees the library
        // when it was opened into the global scope.
        if !dlfcn_core::exports_globally(self.config.flags) {
            let reason = format!("{library}: {}", dlfcn_core::ERR_LOCAL_SCOPE);
            return Err(self.fail(attempt, started, LoadError::library(library, reason)));
        }

        if let Err(reason) = resolver.open(&c_library, self.config.flags) {
            self.log(
                LogEntry::new("", LogLevel::Warn, "library_open")
                    .with_library(library)
                    .with_attempt(attempt)
                    .with_reason(reason.as_str()),
            );
            return Err(self.fail(attempt, started, LoadError::library(library, reason)));
        }

        let mut slots = [NonNull::<c_void>::dangling(); SYMBOL_COUNT];
        for sym in RsocketSymbol::ALL {
            self.stats.lookups.fetch_add(1, Ordering::Relaxed);
            let resolved = CStr::from_bytes_with_nul(sym.c_name())
                .map_err(|_| dlfcn_core::ERR_SYMBOL_NOT_FOUND.to_string())
                .and_then(|name| resolver.lookup(name));
            match resolved {
                Ok(addr) => slots[sym.index()] = addr,
                Err(reason) => {
                    self.log(
                        LogEntry::new("", LogLevel::Warn, "symbol_missing")
                            .with_library(library)
                            .with_symbol(sym.name())
                            .with_attempt(attempt)
                            .with_reason(reason.as_str()),
                    );
                    if self.config.on_failure.releases_on_failure() {
                        resolver.release();
                    }
                    return Err(self.fail(attempt, started, LoadError::symbol(sym, reason)));
                }
            }
        }

        // SAFETY: every slot was filled by the resolver for the symbol at that
        // index, and the SymbolResolver contract guarantees the signatures.
        let table = unsafe { RsocketTable::from_resolved(&slots) };
        self.stats.successes.fetch_add(1, Ordering::Relaxed);
        self.log(
            LogEntry::new("", LogLevel::Info, "load_complete")
                .with_library(library)
                .with_attempt(attempt)
                .with_latency_ns(elapsed_ns(started)),
        );
        Ok(table)
    }

    fn fail(&self, attempt: u64, started: Instant, err: LoadError) -> LoadError {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        let mut entry = LogEntry::new("", LogLevel::Error, "load_failed")
            .with_library(self.config.library.as_str())
            .with_attempt(attempt)
            .with_reason(err.reason())
            .with_latency_ns(elapsed_ns(started));
        if let Some(sym) = err.missing_symbol() {
            entry = entry.with_symbol(sym.name());
        }
        self.log(entry);
        err
    }

    fn log(&self, entry: LogEntry) {
        if let Some(log) = &self.log {
            let _ = log.lock().emit_entry(entry);
        }
    }
}

impl<R: SymbolResolver> std::fmt::Debug for BindingRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("log_error", &self.log_error)
            .finish_non_exhaustive()
    }
}

fn elapsed_ns(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

static GLOBAL_REGISTRY: OnceLock<BindingRegistry<DlResolver>> = OnceLock::new();

/// The process-wide registry, configured from the environment on first use.
#[must_use]
pub fn global_registry() -> &'static BindingRegistry<DlResolver> {
    GLOBAL_REGISTRY
        .get_or_init(|| BindingRegistry::new(DlResolver::new(), LoaderConfig::from_env()))
}

/// Bind the transport's entry points for this process.
pub fn ensure_loaded() -> Result<&'static RsocketTable, LoadError> {
    global_registry().ensure_loaded()
}

/// [`ensure_loaded`] for callers that only need to know the transport is usable.
pub fn load_rsocket() -> Result<(), LoadError> {
    ensure_loaded().map(|_| ())
}

/// Returns true once [`ensure_loaded`] has succeeded in this process.
#[must_use]
pub fn is_loaded() -> bool {
    global_registry().state() == LoadState::Loaded
}

/// The process-wide table, without attempting a load.
#[must_use]
pub fn rsocket_table() -> Option<&'static RsocketTable> {
    global_registry().table()
}
