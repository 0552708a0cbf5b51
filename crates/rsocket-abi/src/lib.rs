// Entry points accept raw pointers from C callers and forward them unchanged;
// per-function safety docs would restate the POSIX contract of each call.
#![allow(clippy::missing_safety_doc)]
//! # rsocket-abi
//!
//! Runtime binding of the RDMA sockets transport.
//!
//! `librdmacm.so.1` is never linked. On first use the loader opens it with
//! `RTLD_GLOBAL | RTLD_LAZY`, resolves the 20 `r`-prefixed entry points in a
//! fixed order, and publishes them as one [`RsocketTable`]. The table is
//! published only when every symbol resolved, so a caller holding a table can
//! call any slot.
//!
//! # Architecture
//!
//! ```text
//! caller -> ensure_loaded() -> BindingRegistry (mutex + OnceLock)
//!                                 -> SymbolResolver (dlopen/dlsym)
//!                                 -> RsocketTable -> r* entry points
//! ```
//!
//! A failed attempt leaves nothing behind except, under the default policy,
//! the mapped library; the next call starts again from `dlopen`.

#[macro_use]
mod macros;

pub mod calls;
pub mod error;
pub mod loader_abi;
pub mod registry;
pub mod resolver;
pub mod structured_log;
pub mod table;

pub use error::{ErrorKind, LoadError};
pub use registry::{
    BindingRegistry, LoadState, LoadStats, LoadStatsSnapshot, ensure_loaded, global_registry,
    is_loaded, load_rsocket, rsocket_table,
};
pub use resolver::{DlResolver, SymbolResolver};
pub use table::RsocketTable;
