use vxi11_frame::BlockError;
use vxi11_transport::{device_error_description, TransportError};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Could not establish a transport channel to the instrument.
    #[error("connect failed: {0}")]
    Connect(#[source] TransportError),

    /// The `create_link` call itself never completed.
    #[error("failed to create link to {address}: {source}")]
    LinkCreate {
        address: String,
        #[source]
        source: TransportError,
    },

    /// The instrument completed `create_link` but refused the link.
    #[error("instrument at {address} refused the link: error {code} ({})", device_error_description(*code))]
    LinkRefused { address: String, code: u32 },

    /// The `destroy_link` call never completed.
    #[error("failed to destroy link: {0}")]
    LinkDestroy(#[source] TransportError),

    /// The caller referenced an address with no live registration.
    ///
    /// A caller-discipline bug (double close, or a stale link), reported
    /// rather than fatal; the registry itself stays intact.
    #[error("no open link registered for address {0}")]
    UnknownAddress(String),

    /// The instrument silently dropped a write fragment.
    ///
    /// Not a protocol error: the call simply never completed, which
    /// usually means the instrument was busy. Retryable.
    #[error("instrument dropped the write")]
    WriteDropped,

    /// The instrument had nothing to say and the read never completed.
    ///
    /// Typically follows a query that timed out on the instrument side.
    /// Retryable.
    #[error("instrument dropped the read")]
    ReadDropped,

    /// The instrument reported a device error for a write.
    #[error("device write error {code} ({})", device_error_description(*code))]
    DeviceWrite { code: u32 },

    /// The instrument reported a device error for a read.
    #[error("device read error {code} ({})", device_error_description(*code))]
    DeviceRead { code: u32 },

    /// The caller's buffer filled up before any terminator arrived.
    #[error("buffer too small: read {read} bytes without hitting a terminator")]
    BufferTooSmall { read: usize },

    /// A reply did not match the definite-length block grammar.
    #[error(transparent)]
    Block(#[from] BlockError),

    /// A numeric query reply was not parseable (strict mode only).
    #[error("could not parse numeric reply {reply:?}")]
    NumericParse { reply: String },
}

impl SessionError {
    /// Whether this is a transient non-response that a query cycle may
    /// legitimately retry, as opposed to a real protocol error.
    pub fn is_dropped(&self) -> bool {
        matches!(self, SessionError::WriteDropped | SessionError::ReadDropped)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
