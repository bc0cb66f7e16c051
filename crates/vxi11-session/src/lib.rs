//! VXI-11 link management, chunked device I/O and query helpers.
//!
//! This is the "just works" layer. A [`Session`] owns one transport channel
//! per instrument address and multiplexes any number of logical links over
//! it. Opening a link for an address already in use reuses the existing
//! channel; closing the last link tears the channel down.
//!
//! Message payloads are fragmented transparently: writes are split into
//! fragments no larger than the instrument's advertised receive size (with
//! a safe fallback for firmware that advertises zero), and reads accumulate
//! fragments until the instrument signals end-of-message or a terminator
//! match.
//!
//! # Thread safety
//!
//! All operations take `&mut self` and block until the transport call
//! returns. There is no internal locking; to share a [`Session`] across
//! threads, wrap the whole session in a mutex you own.

pub mod error;
pub mod query;
pub mod reader;
pub mod registry;
pub mod session;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SessionError};
pub use query::NUMERIC_REPLY_CAPACITY;
pub use registry::{ClientRegistry, Released};
pub use session::{
    Link, NumericMode, Session, SessionConfig, DEFAULT_DEVICE, DEFAULT_LINK_TIMEOUT_MS,
    DEFAULT_READ_TIMEOUT_MS,
};
pub use writer::FALLBACK_CHUNK_SIZE;
