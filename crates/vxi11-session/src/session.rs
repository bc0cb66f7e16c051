use tracing::{debug, warn};

use vxi11_transport::{
    device_error_description, CoreChannel, CoreConnector, CreateLinkRequest, LinkId,
};

use crate::error::{Result, SessionError};
use crate::registry::{ClientRegistry, Released};
use crate::{reader, writer};

/// Default lock/link timeout, in milliseconds.
pub const DEFAULT_LINK_TIMEOUT_MS: u32 = 10_000;

/// Default I/O timeout for reads and queries, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 2_000;

/// Device name used when the caller does not supply one.
pub const DEFAULT_DEVICE: &str = "inst0";

/// How numeric query helpers treat unparseable or failed replies.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum NumericMode {
    /// Propagate every failure to the caller.
    #[default]
    Strict,
    /// Swallow failures and report a zero value, as legacy instrument
    /// libraries did. Each swallowed failure is logged.
    Lenient,
}

/// Tunable session behavior.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Lock timeout for link creation and writes, in milliseconds.
    pub link_timeout_ms: u32,
    /// Default I/O timeout for reads and queries, in milliseconds.
    pub read_timeout_ms: u32,
    /// Optional in-band terminator byte armed on every read.
    pub term_char: Option<u8>,
    /// Failure handling for the numeric query helpers.
    pub numeric_mode: NumericMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            term_char: None,
            numeric_mode: NumericMode::default(),
        }
    }
}

/// An open logical link to a device within an instrument.
///
/// Obtained from [`Session::open`] and consumed by [`Session::close`], so a
/// closed link cannot be reused. Cheap to keep around; all I/O goes through
/// the session that created it.
#[derive(Debug)]
pub struct Link {
    pub(crate) address: String,
    pub(crate) id: LinkId,
    pub(crate) max_recv_size: u32,
}

impl Link {
    /// The instrument address this link belongs to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The link identifier assigned by the instrument.
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Largest write fragment the instrument claims to accept.
    ///
    /// As advertised, which means untrustworthy; zero has been observed
    /// on real firmware. The chunked writer substitutes
    /// [`FALLBACK_CHUNK_SIZE`](crate::FALLBACK_CHUNK_SIZE) for
    /// non-positive values.
    pub fn max_recv_size(&self) -> u32 {
        self.max_recv_size
    }
}

/// Manages links to any number of instruments over shared channels.
///
/// The session owns a [`CoreConnector`] backend (chosen at construction —
/// native RPC transport, vendor driver, or a test double) and a
/// [`ClientRegistry`] that refcounts one channel per instrument address.
pub struct Session<T: CoreConnector> {
    pub(crate) connector: T,
    pub(crate) registry: ClientRegistry<T::Channel>,
    pub(crate) config: SessionConfig,
}

impl<T: CoreConnector> Session<T> {
    /// Create a session with default configuration.
    pub fn new(connector: T) -> Self {
        Self::with_config(connector, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(connector: T, config: SessionConfig) -> Self {
        Self {
            connector,
            registry: ClientRegistry::new(),
            config,
        }
    }

    /// Current session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the registry, e.g. to inspect open link counts.
    pub fn registry(&self) -> &ClientRegistry<T::Channel> {
        &self.registry
    }

    /// Borrow the connector backend.
    pub fn connector(&self) -> &T {
        &self.connector
    }

    /// Open a link to the default device (`inst0`) at `address`.
    pub fn open(&mut self, address: &str) -> Result<Link> {
        self.open_device(address, DEFAULT_DEVICE)
    }

    /// Open a link to a named device at `address`.
    ///
    /// The first link to an address establishes the transport channel;
    /// later links share it. If link creation fails after the channel was
    /// acquired, the acquisition is rolled back before the error returns,
    /// so a failed open never leaks a registration.
    pub fn open_device(&mut self, address: &str, device: &str) -> Result<Link> {
        let Self {
            connector,
            registry,
            config,
        } = self;

        let (channel, _is_new) = registry.acquire(address, |addr| {
            connector.connect(addr).map_err(SessionError::Connect)
        })?;

        let request = CreateLinkRequest {
            // Opaque to the instrument; the process id is as good as any.
            client_id: std::process::id() as i32,
            lock_device: false,
            lock_timeout_ms: config.link_timeout_ms,
            device: device.to_string(),
        };

        match channel.create_link(&request) {
            Ok(reply) if reply.error == 0 => {
                debug!(
                    address,
                    device,
                    link = %reply.link_id,
                    max_recv_size = reply.max_recv_size,
                    "link created"
                );
                Ok(Link {
                    address: address.to_string(),
                    id: reply.link_id,
                    max_recv_size: reply.max_recv_size,
                })
            }
            Ok(reply) => {
                rollback_acquire(registry, address);
                Err(SessionError::LinkRefused {
                    address: address.to_string(),
                    code: reply.error,
                })
            }
            Err(source) => {
                rollback_acquire(registry, address);
                Err(SessionError::LinkCreate {
                    address: address.to_string(),
                    source,
                })
            }
        }
    }

    /// Close a link, tearing the channel down if it was the last one.
    ///
    /// The link is consumed either way. A destroy-link transport failure
    /// takes priority over registry bookkeeping errors; a device error
    /// code in the destroy reply is logged but not surfaced, since the
    /// link is gone regardless.
    pub fn close(&mut self, link: Link) -> Result<()> {
        let destroy_result = match self.registry.channel_mut(&link.address) {
            Some(channel) => channel.destroy_link(link.id),
            None => return Err(SessionError::UnknownAddress(link.address)),
        };

        let released = self.registry.release(&link.address);
        match &released {
            Ok(Released::Last(_)) => {
                debug!(address = %link.address, "last link closed, tearing down channel");
            }
            Ok(Released::Shared { links_remaining }) => {
                debug!(address = %link.address, links_remaining, "link closed, channel stays");
            }
            Err(_) => {}
        }

        match destroy_result {
            Err(source) => Err(SessionError::LinkDestroy(source)),
            Ok(reply) => {
                if reply.error != 0 {
                    warn!(
                        address = %link.address,
                        code = reply.error,
                        description = device_error_description(reply.error),
                        "destroy_link reported a device error"
                    );
                }
                // Released::Last carries the channel; dropping it here is
                // the teardown.
                released.map(|_| ())
            }
        }
    }

    /// Write `data` to the device with the default link timeout.
    pub fn send(&mut self, link: &Link, data: &[u8]) -> Result<()> {
        self.send_timeout(link, data, self.config.link_timeout_ms)
    }

    /// Write `data` to the device.
    ///
    /// The payload is fragmented to the link's negotiated size; `timeout_ms`
    /// applies to each fragment as both I/O and lock timeout.
    pub fn send_timeout(&mut self, link: &Link, data: &[u8], timeout_ms: u32) -> Result<()> {
        let channel = self.channel_for(link)?;
        writer::write_chunked(channel, link, data, timeout_ms)
    }

    /// Read a reply into `buf` with the default read timeout.
    pub fn receive(&mut self, link: &Link, buf: &mut [u8]) -> Result<usize> {
        self.receive_timeout(link, buf, self.config.read_timeout_ms)
    }

    /// Read a reply into `buf`, returning the number of bytes received.
    ///
    /// Accumulates fragments until the instrument signals end-of-message
    /// or a terminator match. Filling `buf` without either signal is a
    /// [`SessionError::BufferTooSmall`] error — the message was truncated.
    pub fn receive_timeout(&mut self, link: &Link, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        let term_char = self.config.term_char;
        let channel = self.channel_for(link)?;
        reader::read_chunked(channel, link, buf, timeout_ms, term_char)
    }

    pub(crate) fn channel_for(&mut self, link: &Link) -> Result<&mut T::Channel> {
        self.registry
            .channel_mut(&link.address)
            .ok_or_else(|| SessionError::UnknownAddress(link.address.clone()))
    }
}

/// Undo a registry acquisition after link creation failed.
///
/// Dropping the returned channel (if this open created it) tears the
/// transport down again.
fn rollback_acquire<C>(registry: &mut ClientRegistry<C>, address: &str) {
    match registry.release(address) {
        Ok(_) => {}
        Err(err) => warn!(address, %err, "rollback of failed open did not find the registration"),
    }
}
