//! Transport availability report.
//!
//! Answers "would the RDMA sockets transport load on this host, and if not,
//! why?" with the same registry the runtime uses.

use std::path::Path;

use rsocket_abi::{BindingRegistry, DlResolver, LoadState, LoadStatsSnapshot, SymbolResolver};
use rsocket_core::{LoaderConfig, RsocketSymbol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// One bound entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRow {
    pub symbol: String,
    pub posix: String,
    /// Hex address, present only once the whole table is bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub library: String,
    pub failure_policy: String,
    pub state: LoadState,
    pub available: bool,
    /// Loader diagnostic when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_symbol: Option<String>,
    pub symbols: Vec<SymbolRow>,
    pub stats: LoadStatsSnapshot,
    /// Why the configured load log could not be opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
}

impl ProbeReport {
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Write the report to `path`.
    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<(), ProbeError> {
        std::fs::write(path, self.to_json(pretty)? + "\n")?;
        Ok(())
    }
}

/// Attempt a load with `registry` and describe the result.
pub fn probe_registry<R: SymbolResolver>(registry: &BindingRegistry<R>) -> ProbeReport {
    let outcome = registry.ensure_loaded();
    let table = outcome.as_ref().ok();
    let symbols = RsocketSymbol::ALL
        .iter()
        .map(|sym| SymbolRow {
            symbol: sym.name().to_string(),
            posix: sym.posix_name().to_string(),
            address: table.map(|t| format!("{:p}", t.address(*sym))),
        })
        .collect();
    let (error, missing_symbol) = match &outcome {
        Ok(_) => (None, None),
        Err(err) => (
            Some(err.reason().to_string()),
            err.missing_symbol().map(|s| s.name().to_string()),
        ),
    };

    ProbeReport {
        library: registry.config().library.clone(),
        failure_policy: registry.config().on_failure.as_str().to_string(),
        state: registry.state(),
        available: outcome.is_ok(),
        error,
        missing_symbol,
        symbols,
        stats: registry.stats(),
        log_error: registry.log_open_error().map(str::to_string),
    }
}

/// Probe with the host dynamic loader and `config`.
#[must_use]
pub fn probe(config: LoaderConfig) -> ProbeReport {
    probe_registry(&BindingRegistry::new(DlResolver::new(), config))
}
