use std::ops::Range;

use super::layout;

/// Fixed-size packet buffer filled field by field.
///
/// Ranges come from `layout` and are always in bounds for the packet being
/// built, so writes are infallible.
pub struct ArtNetWriter {
    buf: Vec<u8>,
}

impl ArtNetWriter {
    /// Start a packet of `len` zeroed bytes with the Art-Net id and `opcode`.
    pub fn new(len: usize, opcode: u16) -> Self {
        let mut writer = Self { buf: vec![0u8; len] };
        writer.write_slice(layout::ID_RANGE, layout::ARTNET_ID);
        writer.write_u16_raw(layout::OP_CODE_RANGE, opcode);
        writer
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) {
        self.buf[offset] = value;
    }

    pub fn write_u16_be(&mut self, range: Range<usize>, value: u16) {
        self.buf[range].copy_from_slice(&value.to_be_bytes());
    }

    pub fn write_u16_raw(&mut self, range: Range<usize>, value: u16) {
        self.buf[range].copy_from_slice(&value.to_ne_bytes());
    }

    pub fn write_u32_raw(&mut self, range: Range<usize>, value: u32) {
        self.buf[range].copy_from_slice(&value.to_ne_bytes());
    }

    pub fn write_slice(&mut self, range: Range<usize>, bytes: &[u8]) {
        self.buf[range].copy_from_slice(bytes);
    }

    /// Copy `value` into a NUL-padded field, truncating so at least one NUL remains.
    pub fn write_cstr(&mut self, range: Range<usize>, value: &str) {
        let max = range.len().saturating_sub(1);
        let bytes = value.as_bytes();
        let len = bytes.len().min(max);
        let start = range.start;
        self.buf[start..start + len].copy_from_slice(&bytes[..len]);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::ArtNetWriter;
    use crate::protocols::artnet::layout;

    #[test]
    fn new_writes_id_and_raw_opcode() {
        let buf = ArtNetWriter::new(layout::SYNC_LEN, layout::OP_SYNC).finish();
        assert_eq!(&buf[layout::ID_RANGE], layout::ARTNET_ID);
        assert_eq!(&buf[layout::OP_CODE_RANGE], &layout::OP_SYNC.to_ne_bytes());
    }

    #[test]
    fn write_cstr_keeps_terminator() {
        let mut writer = ArtNetWriter::new(20, 0);
        writer.write_cstr(12..16, "abcdef");
        let buf = writer.finish();
        assert_eq!(&buf[12..16], b"abc\0");
    }
}
