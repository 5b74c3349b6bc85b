//! Core types and traits for kvbench
//!
//! This crate defines what the benchmark harness and the storage backends
//! agree on:
//! - Backend: the capability interface of an engine under test
//! - BackendIterator: forward cursor with seek
//! - OpenOptions: open-time flags
//! - KvPair: generated key/value pair
//! - Error: backend error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Backend, BackendIterator, OpenOptions, STATS_PROPERTY};
pub use types::{
    display_bytes, is_printable, KvPair, PRINTABLE_ALPHABET_SIZE, PRINTABLE_MAX, PRINTABLE_MIN,
};
