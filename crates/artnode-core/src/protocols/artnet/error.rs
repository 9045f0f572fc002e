use thiserror::Error;

/// Errors returned by Art-Net decoding and encoding.
///
/// # Examples
/// ```
/// use artnode_core::protocols::artnet::ArtNetError;
///
/// let err = ArtNetError::InvalidVersion { version: 13 };
/// assert!(err.to_string().contains("unsupported protocol version"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtNetError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid Art-Net id")]
    InvalidId,
    #[error("unsupported protocol version: {version}")]
    InvalidVersion { version: u16 },
    #[error("invalid ArtDmx length: {length}")]
    InvalidLength { length: u16 },
    #[error("unexpected opcode: {opcode:#06x}")]
    UnexpectedOpcode { opcode: u16 },
}
