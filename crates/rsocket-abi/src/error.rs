//! Load failures.

use rsocket_core::RsocketSymbol;
use thiserror::Error;

/// Classification surfaced to callers.
///
/// There is one kind: the transport is not usable on this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedOperation,
}

/// Why a load attempt failed.
///
/// The display text is the dynamic loader's own diagnostic, e.g.
/// `librdmacm.so.1: cannot open shared object file: No such file or directory`
/// or `undefined symbol: rsocket`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{reason}")]
    LibraryUnavailable { library: String, reason: String },
    #[error("{reason}")]
    SymbolUnavailable {
        symbol: RsocketSymbol,
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn library(library: &str, reason: impl Into<String>) -> Self {
        Self::LibraryUnavailable {
            library: library.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn symbol(symbol: RsocketSymbol, reason: impl Into<String>) -> Self {
        Self::SymbolUnavailable {
            symbol,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::UnsupportedOperation
    }

    /// Dynamic loader diagnostic.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::LibraryUnavailable { reason, .. } | Self::SymbolUnavailable { reason, .. } => {
                reason
            }
        }
    }

    /// The symbol whose lookup failed, if the library itself opened.
    #[must_use]
    pub fn missing_symbol(&self) -> Option<RsocketSymbol> {
        match self {
            Self::SymbolUnavailable { symbol, .. } => Some(*symbol),
            Self::LibraryUnavailable { .. } => None,
        }
    }
}

impl From<LoadError> for std::io::Error {
    fn from(err: LoadError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Unsupported, err)
    }
}
