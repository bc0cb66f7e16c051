use tracing::debug;

use vxi11_transport::{
    CoreChannel, ReadRequest, OP_FLAG_TERMCHAR_SET, REASON_END, REASON_TERM_CHAR,
};

use crate::error::{Result, SessionError};
use crate::session::Link;

/// Read one logical message into `buf`, returning the byte count.
///
/// Issues `device_read` calls until the instrument signals end-of-message
/// or a terminator-character match — the two successful termination
/// conditions. Reaching the requested byte count alone never ends a
/// message: if `buf` fills up without either signal, the message was
/// truncated and [`SessionError::BufferTooSmall`] is returned.
pub(crate) fn read_chunked<C: CoreChannel>(
    channel: &mut C,
    link: &Link,
    buf: &mut [u8],
    timeout_ms: u32,
    term_char: Option<u8>,
) -> Result<usize> {
    let mut filled = 0usize;

    loop {
        let request = ReadRequest {
            link_id: link.id,
            // Never request more in total than the caller asked for.
            request_size: (buf.len() - filled) as u32,
            io_timeout_ms: timeout_ms,
            lock_timeout_ms: timeout_ms,
            flags: if term_char.is_some() {
                OP_FLAG_TERMCHAR_SET
            } else {
                0
            },
            term_char: term_char.unwrap_or(0),
        };

        let reply = channel.device_read(&request).map_err(|err| {
            debug!(link = %link.id, %err, "device_read did not complete");
            SessionError::ReadDropped
        })?;
        if reply.error != 0 {
            return Err(SessionError::DeviceRead { code: reply.error });
        }

        // Clip so the total never exceeds the caller's buffer.
        let take = reply.data.len().min(buf.len() - filled);
        buf[filled..filled + take].copy_from_slice(&reply.data[..take]);
        filled += take;

        if reply.reason & (REASON_END | REASON_TERM_CHAR) != 0 {
            return Ok(filled);
        }
        if filled == buf.len() {
            return Err(SessionError::BufferTooSmall { read: filled });
        }
    }
}
