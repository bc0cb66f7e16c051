/// Errors that can occur while encoding or decoding definite-length blocks.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// The reply does not begin with `#`.
    #[error("data block does not begin with '#' (got 0x{0:02x})")]
    NotABlock(u8),

    /// The digit-count character after `#` is not a decimal digit.
    #[error("invalid digit count character 0x{0:02x}")]
    InvalidDigitCount(u8),

    /// A length digit is not a decimal digit.
    #[error("invalid character 0x{0:02x} in block length")]
    InvalidLength(u8),

    /// The buffer ends before the declared payload does.
    #[error("truncated block ({available} bytes available, {needed} needed)")]
    Truncated { needed: usize, available: usize },

    /// The payload does not fit in the fixed eight length digits.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, BlockError>;
