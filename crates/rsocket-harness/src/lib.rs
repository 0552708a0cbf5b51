//! Tooling around the rsocket shim.
//!
//! - [`probe`]: run one load attempt and describe the outcome as JSON.

pub mod probe;
