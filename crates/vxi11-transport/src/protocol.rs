//! Wire-level types for the four VXI-11 core-channel procedures.
//!
//! Field names and numeric values follow the published VXI-11 specification
//! (the `Device_*` structures from the protocol IDL). Timeouts are in
//! milliseconds throughout, as on the wire.

use bytes::Bytes;

/// `device_write` flag: this fragment completes the logical message.
pub const OP_FLAG_END: u32 = 0x8;

/// `device_read` flag: a terminator character is armed in `term_char`.
pub const OP_FLAG_TERMCHAR_SET: u32 = 0x80;

/// Read stopped because an end indicator was read.
pub const REASON_END: u32 = 0x04;

/// Read stopped because a byte matching the armed terminator was read.
pub const REASON_TERM_CHAR: u32 = 0x02;

/// Read stopped because the requested byte count was transferred.
pub const REASON_REQCNT: u32 = 0x01;

/// Identifier of a logical link, assigned by the instrument on `create_link`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LinkId(pub i32);

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for the `create_link` procedure.
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    /// Opaque client identifier echoed back by some instruments.
    pub client_id: i32,
    /// Request an exclusive device lock along with the link.
    pub lock_device: bool,
    /// How long the instrument may wait for the lock, in milliseconds.
    pub lock_timeout_ms: u32,
    /// Device name within the instrument, e.g. `inst0` or `gpib0,4`.
    pub device: String,
}

/// Reply to `create_link`.
#[derive(Debug, Clone, Copy)]
pub struct CreateLinkReply {
    /// Device error code; nonzero means the instrument refused the link.
    pub error: u32,
    /// The link identifier to use on all subsequent calls.
    pub link_id: LinkId,
    /// TCP port for the (unimplemented here) abort channel.
    pub abort_port: u16,
    /// Largest payload the instrument accepts in a single `device_write`.
    ///
    /// Advertised by the instrument and untrustworthy: some firmware
    /// returns 0, violating rule B.6.3 of the protocol. Consumers must
    /// substitute a safe default before using this as a chunk size.
    pub max_recv_size: u32,
}

/// Reply to `destroy_link`.
#[derive(Debug, Clone, Copy)]
pub struct DestroyLinkReply {
    /// Device error code; nonzero means teardown failed on the instrument.
    pub error: u32,
}

/// Parameters for the `device_write` procedure (one fragment).
#[derive(Debug)]
pub struct WriteRequest<'a> {
    pub link_id: LinkId,
    pub io_timeout_ms: u32,
    pub lock_timeout_ms: u32,
    /// Operation flags; [`OP_FLAG_END`] on the final fragment.
    pub flags: u32,
    /// Fragment payload, at most the link's negotiated receive size.
    pub data: &'a [u8],
}

/// Reply to `device_write`.
#[derive(Debug, Clone, Copy)]
pub struct WriteReply {
    /// Device error code, surfaced verbatim.
    pub error: u32,
    /// Number of bytes the instrument actually accepted.
    pub size: u32,
}

/// Parameters for the `device_read` procedure (one fragment).
#[derive(Debug, Clone, Copy)]
pub struct ReadRequest {
    pub link_id: LinkId,
    /// Upper bound on the bytes returned by this call.
    pub request_size: u32,
    pub io_timeout_ms: u32,
    pub lock_timeout_ms: u32,
    /// Operation flags; [`OP_FLAG_TERMCHAR_SET`] arms `term_char`.
    pub flags: u32,
    /// Terminator byte, only meaningful when armed via `flags`.
    pub term_char: u8,
}

/// Reply to `device_read`.
#[derive(Debug, Clone)]
pub struct ReadReply {
    /// Device error code, surfaced verbatim.
    pub error: u32,
    /// Why the read stopped: a combination of the `REASON_*` bits.
    pub reason: u32,
    /// Bytes read from the instrument.
    pub data: Bytes,
}

/// Returns the published description for a VXI-11 device error code.
///
/// Codes are from section B.5.2 of the protocol specification and are
/// passed through verbatim by this library, never reinterpreted.
pub fn device_error_description(code: u32) -> &'static str {
    match code {
        0 => "no error",
        1 => "syntax error",
        3 => "device not accessible",
        4 => "invalid link identifier",
        5 => "parameter error",
        6 => "channel not established",
        8 => "operation not supported",
        9 => "out of resources",
        11 => "device locked by another link",
        12 => "no lock held by this link",
        15 => "I/O timeout",
        17 => "I/O error",
        21 => "invalid address",
        23 => "abort",
        29 => "channel already established",
        _ => "unknown error",
    }
}
