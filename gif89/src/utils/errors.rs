#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("Out of data: requested {requested} bytes, {remaining} remaining")]
    OutOfData { requested: usize, remaining: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Out of data: {0} bytes is too short for a GIF header")]
    TooShort(usize),

    #[error("Incorrect gif header, missing GIF87a or GIF89a identifier. Read {0:02X?}")]
    InvalidSignature([u8; 6]),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Logical screen descriptor truncated: {0} bytes available, 7 required")]
    TruncatedScreenDescriptor(usize),

    #[error("Color table truncated: expected {expected} entries, found {found}")]
    TruncatedColorTable { expected: usize, found: usize },

    #[error("Image descriptor truncated at offset {0}")]
    TruncatedImageDescriptor(usize),

    #[error("Minimum LZW code size must be between 2 and 8. Read {0}")]
    InvalidMinCodeSize(u8),

    #[error("Image data ended after {produced} of {expected} pixels")]
    TruncatedImageData { produced: usize, expected: usize },

    #[error("Invalid LZW code after {produced} of {expected} pixels")]
    InvalidCode { produced: usize, expected: usize },

    #[error("LZW code table full without a clear code after {0} pixels")]
    TableOverflow(usize),

    #[error("Image data terminator is not zero, skipped {0} trailing bytes")]
    TrailingSubBlocks(usize),

    #[error("Image data terminator missing at end of input")]
    MissingTerminator,

    #[error("Unknown chunk tag {tag:#04X} at offset {offset}")]
    UnknownChunk { tag: u8, offset: usize },

    #[error("No color table for image at offset {0}, falling back to grayscale")]
    MissingColorTable(usize),

    #[error("Input ended at offset {0} without a trailer")]
    MissingTrailer(usize),
}
