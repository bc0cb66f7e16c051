use tracing::debug;

use crate::error::{Result, SessionError};

/// Refcounted table of transport channels, keyed by instrument address.
///
/// One channel is shared by every logical link to the same address; the
/// registry tracks how many links are alive so the channel is torn down
/// exactly when the last one closes. Lookup is a linear scan — the table
/// holds one entry per distinct instrument, which is small in practice.
///
/// The registry performs no locking of its own. It is owned by a
/// [`Session`](crate::Session) and mutated synchronously during open and
/// close; concurrent use requires an external mutex around the session.
pub struct ClientRegistry<C> {
    clients: Vec<RegisteredClient<C>>,
}

struct RegisteredClient<C> {
    address: String,
    channel: C,
    link_count: usize,
}

/// Outcome of releasing one link for an address.
#[derive(Debug)]
pub enum Released<C> {
    /// Other links to the instrument remain; the channel stays open.
    Shared { links_remaining: usize },
    /// That was the last link. The entry is gone and the channel is handed
    /// back so the caller can tear it down (dropping it suffices).
    Last(C),
}

impl<C> ClientRegistry<C> {
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
        }
    }

    /// Look up or establish the channel for `address`.
    ///
    /// On a hit the link count is incremented and the existing channel
    /// returned with `false`. On a miss `connect` is invoked; its failure
    /// propagates untouched and leaves the registry unchanged. Success
    /// inserts a fresh entry with a link count of 1 and returns `true`.
    pub fn acquire<E>(
        &mut self,
        address: &str,
        connect: impl FnOnce(&str) -> std::result::Result<C, E>,
    ) -> std::result::Result<(&mut C, bool), E> {
        if let Some(index) = self.position(address) {
            let entry = &mut self.clients[index];
            entry.link_count += 1;
            debug!(address, links = entry.link_count, "reusing registered client");
            return Ok((&mut entry.channel, false));
        }

        let channel = connect(address)?;
        debug!(address, "registered new client");
        self.clients.push(RegisteredClient {
            address: address.to_string(),
            channel,
            link_count: 1,
        });
        let entry = self
            .clients
            .last_mut()
            .expect("entry was pushed on the line above");
        Ok((&mut entry.channel, true))
    }

    /// Drop one link for `address`.
    ///
    /// Fails with [`SessionError::UnknownAddress`] when no registration
    /// exists — a caller bug, but a recoverable one: every other entry is
    /// left untouched.
    pub fn release(&mut self, address: &str) -> Result<Released<C>> {
        let Some(index) = self.position(address) else {
            return Err(SessionError::UnknownAddress(address.to_string()));
        };

        if self.clients[index].link_count > 1 {
            let entry = &mut self.clients[index];
            entry.link_count -= 1;
            debug!(address, links = entry.link_count, "released link, client stays");
            Ok(Released::Shared {
                links_remaining: entry.link_count,
            })
        } else {
            let entry = self.clients.swap_remove(index);
            debug!(address, "released last link, client removed");
            Ok(Released::Last(entry.channel))
        }
    }

    /// The channel registered for `address`, if any link to it is open.
    pub fn channel_mut(&mut self, address: &str) -> Option<&mut C> {
        self.clients
            .iter_mut()
            .find(|client| client.address == address)
            .map(|client| &mut client.channel)
    }

    /// How many links are open to `address`.
    pub fn link_count(&self, address: &str) -> Option<usize> {
        self.clients
            .iter()
            .find(|client| client.address == address)
            .map(|client| client.link_count)
    }

    /// Number of distinct instruments with at least one open link.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn position(&self, address: &str) -> Option<usize> {
        self.clients
            .iter()
            .position(|client| client.address == address)
    }
}

impl<C> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
