use tracing::debug;

use vxi11_transport::{CoreChannel, WriteRequest, OP_FLAG_END};

use crate::error::{Result, SessionError};
use crate::session::Link;

/// Chunk size substituted when the instrument advertises a non-positive
/// maximum receive size.
///
/// Some firmware (notably certain Agilent Infiniium revisions) advertises
/// a `max_recv_size` of 0, violating rule B.6.3 of the protocol. Writing
/// 0-byte fragments would hang forever, so anything non-positive falls
/// back to 4 kB, which every instrument copes with.
pub const FALLBACK_CHUNK_SIZE: usize = 4096;

/// Write `data` as a sequence of fragments, END-flagged on the last.
///
/// Fragments are at most the link's advertised receive size (guarded by
/// [`FALLBACK_CHUNK_SIZE`]). `timeout_ms` applies to every fragment as
/// both I/O and lock timeout. The instrument may accept fewer bytes than
/// a fragment carries; the remainder is carried over into the next one.
pub(crate) fn write_chunked<C: CoreChannel>(
    channel: &mut C,
    link: &Link,
    data: &[u8],
    timeout_ms: u32,
) -> Result<()> {
    let threshold = effective_chunk_size(link.max_recv_size);
    let mut bytes_left = data.len();

    // Even an empty payload goes out as one END-flagged fragment.
    loop {
        let (flags, fragment_len) = if bytes_left <= threshold {
            (OP_FLAG_END, bytes_left)
        } else {
            (0, threshold)
        };
        let offset = data.len() - bytes_left;

        let request = WriteRequest {
            link_id: link.id,
            io_timeout_ms: timeout_ms,
            lock_timeout_ms: timeout_ms,
            flags,
            data: &data[offset..offset + fragment_len],
        };

        let reply = channel.device_write(&request).map_err(|err| {
            debug!(link = %link.id, %err, "device_write did not complete");
            SessionError::WriteDropped
        })?;
        if reply.error != 0 {
            return Err(SessionError::DeviceWrite { code: reply.error });
        }

        let accepted = reply.size as usize;
        if accepted == 0 && fragment_len > 0 {
            // An instrument that accepts nothing of a nonempty fragment
            // will accept nothing of the retransmission either; surfacing
            // the dropped-write sentinel beats looping forever.
            debug!(link = %link.id, fragment_len, "instrument accepted zero bytes");
            return Err(SessionError::WriteDropped);
        }
        bytes_left -= accepted.min(bytes_left);

        if bytes_left == 0 {
            return Ok(());
        }
    }
}

fn effective_chunk_size(max_recv_size: u32) -> usize {
    if max_recv_size > 0 {
        max_recv_size as usize
    } else {
        FALLBACK_CHUNK_SIZE
    }
}
