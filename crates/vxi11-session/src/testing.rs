//! Scripted transport doubles shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use vxi11_transport::{
    CoreChannel, CoreConnector, CreateLinkReply, CreateLinkRequest, DestroyLinkReply, LinkId,
    ReadReply, ReadRequest, TransportError, WriteReply, WriteRequest, REASON_END,
};

pub(crate) fn rpc_failure() -> TransportError {
    TransportError::Call(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "no reply from instrument",
    ))
}

pub(crate) fn connect_refused(address: &str) -> TransportError {
    TransportError::Connect {
        address: address.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
    }
}

#[derive(Debug)]
pub(crate) struct RecordedWrite {
    pub flags: u32,
    pub io_timeout_ms: u32,
    pub data: Vec<u8>,
}

/// Everything a [`MockChannel`] was told plus the replies still scripted.
///
/// Tests keep a clone of the `Arc` so the state stays inspectable after the
/// channel has been moved into a session's registry.
#[derive(Debug, Default)]
pub(crate) struct ChannelState {
    pub create_replies: VecDeque<Result<CreateLinkReply, TransportError>>,
    pub destroy_replies: VecDeque<Result<DestroyLinkReply, TransportError>>,
    pub write_replies: VecDeque<Result<WriteReply, TransportError>>,
    pub read_replies: VecDeque<Result<ReadReply, TransportError>>,
    pub writes: Vec<RecordedWrite>,
    pub reads: Vec<ReadRequest>,
    pub destroyed: Vec<LinkId>,
}

#[derive(Clone, Default)]
pub(crate) struct MockChannel {
    pub state: Arc<Mutex<ChannelState>>,
}

impl MockChannel {
    pub fn new() -> (Self, Arc<Mutex<ChannelState>>) {
        let channel = Self::default();
        let state = channel.state.clone();
        (channel, state)
    }

    pub fn link_reply(link_id: i32, max_recv_size: u32) -> CreateLinkReply {
        CreateLinkReply {
            error: 0,
            link_id: LinkId(link_id),
            abort_port: 0,
            max_recv_size,
        }
    }

    pub fn read_reply(data: &[u8], reason: u32) -> ReadReply {
        ReadReply {
            error: 0,
            reason,
            data: Bytes::copy_from_slice(data),
        }
    }
}

impl CoreChannel for MockChannel {
    fn create_link(
        &mut self,
        _request: &CreateLinkRequest,
    ) -> Result<CreateLinkReply, TransportError> {
        let mut state = self.state.lock().unwrap();
        state
            .create_replies
            .pop_front()
            .unwrap_or(Ok(Self::link_reply(1, 1024)))
    }

    fn destroy_link(&mut self, link_id: LinkId) -> Result<DestroyLinkReply, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.destroyed.push(link_id);
        state
            .destroy_replies
            .pop_front()
            .unwrap_or(Ok(DestroyLinkReply { error: 0 }))
    }

    fn device_write(&mut self, request: &WriteRequest<'_>) -> Result<WriteReply, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(RecordedWrite {
            flags: request.flags,
            io_timeout_ms: request.io_timeout_ms,
            data: request.data.to_vec(),
        });
        let accepted = request.data.len() as u32;
        state
            .write_replies
            .pop_front()
            .unwrap_or(Ok(WriteReply {
                error: 0,
                size: accepted,
            }))
    }

    fn device_read(&mut self, request: &ReadRequest) -> Result<ReadReply, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.reads.push(*request);
        state
            .read_replies
            .pop_front()
            .unwrap_or(Ok(Self::read_reply(b"", REASON_END)))
    }
}

/// Hands out prepared channels in order; connects a fresh default channel
/// once the script runs dry.
#[derive(Default)]
pub(crate) struct MockConnector {
    pub prepared: VecDeque<Result<MockChannel, TransportError>>,
    pub connected: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, channel: MockChannel) {
        self.prepared.push_back(Ok(channel));
    }

    pub fn prepare_failure(&mut self, error: TransportError) {
        self.prepared.push_back(Err(error));
    }
}

impl CoreConnector for MockConnector {
    type Channel = MockChannel;

    fn connect(&mut self, address: &str) -> Result<MockChannel, TransportError> {
        self.connected.lock().unwrap().push(address.to_string());
        self.prepared
            .pop_front()
            .unwrap_or_else(|| Ok(MockChannel::default()))
    }
}
