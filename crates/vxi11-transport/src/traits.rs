use crate::error::Result;
use crate::protocol::{
    CreateLinkReply, CreateLinkRequest, DestroyLinkReply, LinkId, ReadReply, ReadRequest,
    WriteReply, WriteRequest,
};

/// The four blocking VXI-11 core-channel procedures.
///
/// A `CoreChannel` is one RPC connection to one instrument address. All
/// logical links to that instrument share the same channel; the session
/// layer keeps the refcount. Every method blocks until the remote replies
/// or the call fails.
///
/// An `Err` return means the call itself did not complete (connection
/// trouble or the instrument silently dropped the request). A completed
/// call that the instrument rejected comes back as `Ok` with a nonzero
/// device error code in the reply; those codes are never reinterpreted
/// here.
pub trait CoreChannel {
    /// Establish a logical link to a device within the instrument.
    fn create_link(&mut self, request: &CreateLinkRequest) -> Result<CreateLinkReply>;

    /// Tear down a logical link.
    fn destroy_link(&mut self, link_id: LinkId) -> Result<DestroyLinkReply>;

    /// Write one fragment of a message to the device.
    fn device_write(&mut self, request: &WriteRequest<'_>) -> Result<WriteReply>;

    /// Read one fragment of a reply from the device.
    fn device_read(&mut self, request: &ReadRequest) -> Result<ReadReply>;
}

/// Produces [`CoreChannel`]s for instrument addresses.
///
/// This is the seam where a backend is chosen: a native ONC RPC transport,
/// a vendor instrumentation driver, or a scripted double in tests. The
/// session layer calls `connect` once per distinct address and multiplexes
/// every link to that address over the returned channel.
pub trait CoreConnector {
    type Channel: CoreChannel;

    /// Open a channel to the instrument at `address`.
    ///
    /// Fails with [`TransportError::Connect`](crate::TransportError::Connect)
    /// when the remote is unreachable or refuses the core-channel program.
    fn connect(&mut self, address: &str) -> Result<Self::Channel>;
}
