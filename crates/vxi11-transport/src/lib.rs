//! VXI-11 core-channel transport abstraction.
//!
//! The VXI-11 core channel consists of four blocking remote procedures:
//! `create_link`, `destroy_link`, `device_write` and `device_read`. This
//! crate models them as the [`CoreChannel`] capability trait, together with
//! the wire-level request/reply types, operation flags, read-termination
//! reason bits and the published device error code table.
//!
//! Concrete backends (an ONC RPC client, a vendor instrumentation driver, or
//! a test double) implement [`CoreChannel`] and are produced by a
//! [`CoreConnector`] selected at construction time. Everything else in the
//! workspace builds on top of these two traits.

pub mod error;
pub mod protocol;
pub mod traits;

pub use error::{Result, TransportError};
pub use protocol::{
    device_error_description, CreateLinkRequest, CreateLinkReply, DestroyLinkReply, LinkId,
    ReadReply, ReadRequest, WriteReply, WriteRequest, OP_FLAG_END, OP_FLAG_TERMCHAR_SET,
    REASON_END, REASON_REQCNT, REASON_TERM_CHAR,
};
pub use traits::{CoreChannel, CoreConnector};
