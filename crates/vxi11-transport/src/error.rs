/// Errors that can occur in core-channel transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to reach the instrument or the remote refused the RPC program.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// An issued remote call never completed.
    ///
    /// This is the "instrument silently dropped it" condition: no reply
    /// arrived, but the connection itself is not necessarily dead. Higher
    /// layers turn this into their retryable dropped-write/dropped-read
    /// sentinels.
    #[error("rpc call did not complete: {0}")]
    Call(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
