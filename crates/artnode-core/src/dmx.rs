use std::fmt;

use crate::protocols::artnet::layout::DMX_MAX_SLOTS;
use crate::protocols::artnet::{ArtDmx, ArtNetError};

/// One DMX universe update moved between ports.
///
/// `sync_mode` is stamped by the node when the frame is accepted by an
/// output port, not by the sender.
#[derive(Clone, PartialEq, Eq)]
pub struct DmxFrame {
    pub sync_mode: bool,
    /// Sender sequence number; 0 disables sequencing.
    pub seq: u8,
    len: u16,
    slots: [u8; DMX_MAX_SLOTS],
}

impl DmxFrame {
    pub fn new(seq: u8, data: &[u8]) -> Result<Self, ArtNetError> {
        if data.len() > DMX_MAX_SLOTS {
            return Err(ArtNetError::InvalidLength {
                length: u16::try_from(data.len()).unwrap_or(u16::MAX),
            });
        }
        let mut slots = [0u8; DMX_MAX_SLOTS];
        slots[..data.len()].copy_from_slice(data);
        Ok(Self {
            sync_mode: false,
            seq,
            len: data.len() as u16,
            slots,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.slots[..self.len()]
    }
}

impl From<&ArtDmx<'_>> for DmxFrame {
    fn from(dmx: &ArtDmx<'_>) -> Self {
        let len = dmx.data.len().min(DMX_MAX_SLOTS);
        let mut slots = [0u8; DMX_MAX_SLOTS];
        slots[..len].copy_from_slice(&dmx.data[..len]);
        Self {
            sync_mode: false,
            seq: dmx.sequence,
            len: len as u16,
            slots,
        }
    }
}

impl fmt::Debug for DmxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmxFrame")
            .field("sync_mode", &self.sync_mode)
            .field("seq", &self.seq)
            .field("len", &self.len)
            .field("data", &self.data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::DmxFrame;

    #[test]
    fn new_rejects_oversized() {
        assert!(DmxFrame::new(0, &[0u8; 513]).is_err());
        let frame = DmxFrame::new(3, &[1, 2]).unwrap();
        assert_eq!(frame.data(), &[1, 2]);
        assert!(!frame.sync_mode);
    }
}
