//! # rsocket-core
//!
//! Pure-logic half of the rsocket shim.
//!
//! The RDMA sockets transport (`librdmacm`) is loaded at runtime, never linked.
//! This crate knows *what* gets loaded: the library name, the dlopen mode, the
//! fixed catalogue of `r`-prefixed symbols and the order they are resolved in,
//! the environment-driven loader configuration, and the socket-argument
//! validators applied before a call crosses into the library. Actual
//! `dlopen`/`dlsym` invocations live in the ABI crate.

#![deny(unsafe_code)]

pub mod config;
pub mod dlfcn;
pub mod socket;
pub mod symbols;

pub use config::{FailurePolicy, LoaderConfig};
pub use symbols::{RsocketSymbol, SYMBOL_COUNT};
