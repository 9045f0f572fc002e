use std::ops::Range;

use super::error::ArtNetError;
use super::layout;

/// Bounds-checked view over an Art-Net datagram.
///
/// Art-Net mixes two 16-bit conventions: some fields are sent in network
/// byte order, others are the sender's raw in-memory `u16` and are read back
/// without conversion. Each field must use the matching accessor.
pub struct ArtNetReader<'a> {
    payload: &'a [u8],
}

impl<'a> ArtNetReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ArtNetError> {
        if self.payload.len() < needed {
            return Err(ArtNetError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ArtNetError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(ArtNetError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    /// Network byte order field.
    pub fn read_u16_be(&self, range: Range<usize>) -> Result<u16, ArtNetError> {
        let bytes = self.read_array::<2>(range)?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Raw field, interpreted in local byte order.
    pub fn read_u16_raw(&self, range: Range<usize>) -> Result<u16, ArtNetError> {
        let bytes = self.read_array::<2>(range)?;
        Ok(u16::from_ne_bytes(bytes))
    }

    pub fn read_u32_raw(&self, range: Range<usize>) -> Result<u32, ArtNetError> {
        let bytes = self.read_array::<4>(range)?;
        Ok(u32::from_ne_bytes(bytes))
    }

    pub fn read_array<const N: usize>(&self, range: Range<usize>) -> Result<[u8; N], ArtNetError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| ArtNetError::TooShort {
            needed: N,
            actual: bytes.len(),
        })
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], ArtNetError> {
        self.payload.get(range.clone()).ok_or(ArtNetError::TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    /// NUL-terminated string field; bytes after the first NUL are ignored.
    pub fn read_cstr(&self, range: Range<usize>) -> Result<String, ArtNetError> {
        let bytes = self.read_slice(range)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn read_signature(&self) -> Result<&'a [u8], ArtNetError> {
        self.read_slice(layout::ID_RANGE)
    }
}
