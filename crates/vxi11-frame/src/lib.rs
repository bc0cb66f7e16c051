//! Definite-length binary block framing for VXI-11 bulk data transfer.
//!
//! Instruments transfer bulk data (waveforms, screenshots, setups) as
//! definite-length blocks:
//!
//! ```text
//! #800001000<1000 bytes of data>
//! ||\______/
//! ||    |
//! ||    \---- payload length in ASCII decimal, zero padded
//! |\--------- number of length digits that follow (1-9)
//! \---------- always starts with #
//! ```
//!
//! Encoding always emits eight length digits; decoding accepts the general
//! 1-9 digit form, plus the degenerate `#0` an instrument sends when it
//! failed to acquire the requested data.

pub mod codec;
pub mod error;

pub use codec::{decode_block, encode_block, LENGTH_DIGITS, MAX_HEADER_SIZE, MAX_PAYLOAD};
pub use error::{BlockError, Result};
