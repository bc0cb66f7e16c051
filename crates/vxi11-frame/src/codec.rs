use bytes::{BufMut, BytesMut};

use crate::error::{BlockError, Result};

/// Number of length digits emitted by [`encode_block`].
pub const LENGTH_DIGITS: usize = 8;

/// Largest payload expressible with [`LENGTH_DIGITS`] length digits.
pub const MAX_PAYLOAD: usize = 100_000_000 - 1;

/// Upper bound on a block header: `#`, one digit-count digit, up to nine
/// length digits, and one spare byte for sizing scratch buffers.
pub const MAX_HEADER_SIZE: usize = 12;

/// Encode a command prefix and payload as a definite-length block.
///
/// Produces `<prefix>#8<eight zero-padded length digits><payload>`, the
/// exact framing instruments expect for bulk writes (e.g. loading arbitrary
/// waveform data). The prefix is typically a command with a trailing space,
/// such as `"DATA:DAC VOLATILE, "`.
pub fn encode_block(prefix: &str, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(BlockError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(prefix.len() + 2 + LENGTH_DIGITS + payload.len());
    dst.put_slice(prefix.as_bytes());
    dst.put_u8(b'#');
    dst.put_u8(b'0' + LENGTH_DIGITS as u8);

    let mut digits = [b'0'; LENGTH_DIGITS];
    let mut len = payload.len();
    for slot in digits.iter_mut().rev() {
        *slot = b'0' + (len % 10) as u8;
        len /= 10;
    }
    dst.put_slice(&digits);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a definite-length block, returning the payload as a subslice.
///
/// Accepts any digit count from 1 to 9. A digit count of 0 (`#0`) is how
/// some instruments signal that they failed to acquire the requested data;
/// it decodes to an empty payload, not an error.
pub fn decode_block(src: &[u8]) -> Result<&[u8]> {
    let (&lead, rest) = src.split_first().ok_or(BlockError::Truncated {
        needed: 2,
        available: src.len(),
    })?;
    if lead != b'#' {
        return Err(BlockError::NotABlock(lead));
    }

    let (&count, rest) = rest.split_first().ok_or(BlockError::Truncated {
        needed: 2,
        available: src.len(),
    })?;
    if !count.is_ascii_digit() {
        return Err(BlockError::InvalidDigitCount(count));
    }
    let ndigits = (count - b'0') as usize;
    if ndigits == 0 {
        return Ok(&[]);
    }

    if rest.len() < ndigits {
        return Err(BlockError::Truncated {
            needed: 2 + ndigits,
            available: src.len(),
        });
    }
    let (length_digits, payload) = rest.split_at(ndigits);

    let mut length = 0usize;
    for &digit in length_digits {
        if !digit.is_ascii_digit() {
            return Err(BlockError::InvalidLength(digit));
        }
        length = length * 10 + (digit - b'0') as usize;
    }

    payload.get(..length).ok_or(BlockError::Truncated {
        needed: length,
        available: payload.len(),
    })
}
