//! Loader configuration.
//!
//! Read from the environment once, when the process-wide registry is built:
//! - `RSOCKET_LIBRARY`: library to open instead of `librdmacm.so.1`.
//! - `RSOCKET_ON_FAILURE`: what to do with a library opened by a load attempt
//!   that later fails on a missing symbol. `keep` (default) leaves it resident;
//!   `close` hands the handle back to the dynamic loader.
//! - `RSOCKET_LOG`: path of a JSONL file receiving load events.

use std::path::PathBuf;

use crate::dlfcn;

pub const ENV_LIBRARY: &str = "RSOCKET_LIBRARY";
pub const ENV_ON_FAILURE: &str = "RSOCKET_ON_FAILURE";
pub const ENV_LOG: &str = "RSOCKET_LOG";

/// Handling of the library handle after a failed load attempt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Leave the library mapped. A later attempt re-opens it, which only bumps
    /// the loader's reference count.
    #[default]
    KeepResident,
    /// `dlclose` the handle before reporting the failure.
    Close,
}

impl FailurePolicy {
    /// Parse from string (case-insensitive). Unknown values keep the default.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" | "unload" | "release" | "dlclose" => Self::Close,
            _ => Self::KeepResident,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepResident => "keep",
            Self::Close => "close",
        }
    }

    /// Returns true if a failed attempt should release its handle.
    #[must_use]
    pub const fn releases_on_failure(self) -> bool {
        matches!(self, Self::Close)
    }
}

/// Everything the loader needs to know before its first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Library passed to `dlopen`.
    pub library: String,
    /// dlopen mode.
    pub flags: i32,
    pub on_failure: FailurePolicy,
    /// JSONL destination for load events, if any.
    pub log_path: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            library: dlfcn::DEFAULT_LIBRARY.to_string(),
            flags: dlfcn::LOAD_FLAGS,
            on_failure: FailurePolicy::default(),
            log_path: None,
        }
    }
}

impl LoaderConfig {
    /// Build the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// A library override that is empty or contains a NUL byte is ignored,
    /// as is an empty log path.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(library) = lookup(ENV_LIBRARY) {
            let library = library.trim();
            if dlfcn::valid_library_name(library) {
                config.library = library.to_string();
            }
        }
        if let Some(policy) = lookup(ENV_ON_FAILURE) {
            config.on_failure = FailurePolicy::from_str_loose(&policy);
        }
        if let Some(path) = lookup(ENV_LOG) {
            if !path.trim().is_empty() {
                config.log_path = Some(PathBuf::from(path));
            }
        }
        config
    }

    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }
}
