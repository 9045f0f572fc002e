use super::error::ArtNetError;
use super::layout;
use super::reader::ArtNetReader;

/// Art-Net opcodes handled by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Poll,
    PollReply,
    Dmx,
    Sync,
}

impl OpCode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            layout::OP_POLL => Some(Self::Poll),
            layout::OP_POLL_REPLY => Some(Self::PollReply),
            layout::OP_DMX => Some(Self::Dmx),
            layout::OP_SYNC => Some(Self::Sync),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub opcode: u16,
    pub version: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtPoll {
    pub ttm: u8,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtPollReply {
    pub ip_address: [u8; 4],
    pub port_number: u16,
    pub version_info: u16,
    pub net_switch: u8,
    pub sub_switch: u8,
    pub short_name: String,
    pub long_name: String,
    pub num_ports: u16,
    pub port_types: [u8; 4],
    pub good_input: [u8; 4],
    pub good_output: [u8; 4],
    pub sw_in: [u8; 4],
    pub sw_out: [u8; 4],
    pub mac: [u8; 6],
    pub bind_ip: u32,
    pub bind_index: u8,
    pub status2: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtDmx<'a> {
    pub sequence: u8,
    pub physical: u8,
    pub sub_uni: u8,
    pub net: u8,
    pub data: &'a [u8],
}

impl ArtDmx<'_> {
    /// 16-bit port address, `net` in the high byte.
    pub fn address(&self) -> u16 {
        (u16::from(self.net) << 8) | u16::from(self.sub_uni)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtSync {
    pub aux1: u8,
    pub aux2: u8,
}

/// Decoded Art-Net datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet<'a> {
    Poll(ArtPoll),
    PollReply(ArtPollReply),
    Dmx(ArtDmx<'a>),
    Sync(ArtSync),
    /// Valid header with an opcode the node does not handle.
    Unknown(Header),
}

/// Validate the id and protocol version and return the header fields.
pub fn parse_header(payload: &[u8]) -> Result<Header, ArtNetError> {
    let reader = ArtNetReader::new(payload);
    reader.require_len(layout::HEADER_LEN)?;

    if reader.read_signature()? != layout::ARTNET_ID {
        return Err(ArtNetError::InvalidId);
    }

    let opcode = reader.read_u16_raw(layout::OP_CODE_RANGE)?;
    let version = reader.read_u16_be(layout::VERSION_RANGE)?;
    if version < layout::ARTNET_VERSION {
        return Err(ArtNetError::InvalidVersion { version });
    }

    Ok(Header { opcode, version })
}

pub fn parse_poll(payload: &[u8]) -> Result<ArtPoll, ArtNetError> {
    expect_opcode(payload, layout::OP_POLL)?;
    let reader = ArtNetReader::new(payload);
    reader.require_len(layout::POLL_LEN)?;

    Ok(ArtPoll {
        ttm: reader.read_u8(layout::POLL_TTM_OFFSET)?,
        priority: reader.read_u8(layout::POLL_PRIORITY_OFFSET)?,
    })
}

/// Decode an ArtPollReply. The reply carries no version field, so only the
/// id and opcode are checked.
pub fn parse_poll_reply(payload: &[u8]) -> Result<ArtPollReply, ArtNetError> {
    let reader = ArtNetReader::new(payload);
    reader.require_len(layout::POLL_REPLY_LEN)?;
    if reader.read_signature()? != layout::ARTNET_ID {
        return Err(ArtNetError::InvalidId);
    }
    let opcode = reader.read_u16_raw(layout::OP_CODE_RANGE)?;
    if opcode != layout::OP_POLL_REPLY {
        return Err(ArtNetError::UnexpectedOpcode { opcode });
    }

    Ok(ArtPollReply {
        ip_address: reader.read_array(layout::REPLY_IP_RANGE)?,
        port_number: reader.read_u16_raw(layout::REPLY_PORT_RANGE)?,
        version_info: reader.read_u16_be(layout::REPLY_VERSION_INFO_RANGE)?,
        net_switch: reader.read_u8(layout::REPLY_NET_SWITCH_OFFSET)?,
        sub_switch: reader.read_u8(layout::REPLY_SUB_SWITCH_OFFSET)?,
        short_name: reader.read_cstr(layout::REPLY_SHORT_NAME_RANGE)?,
        long_name: reader.read_cstr(layout::REPLY_LONG_NAME_RANGE)?,
        num_ports: reader.read_u16_be(layout::REPLY_NUM_PORTS_RANGE)?,
        port_types: reader.read_array(layout::REPLY_PORT_TYPES_RANGE)?,
        good_input: reader.read_array(layout::REPLY_GOOD_INPUT_RANGE)?,
        good_output: reader.read_array(layout::REPLY_GOOD_OUTPUT_RANGE)?,
        sw_in: reader.read_array(layout::REPLY_SW_IN_RANGE)?,
        sw_out: reader.read_array(layout::REPLY_SW_OUT_RANGE)?,
        mac: reader.read_array(layout::REPLY_MAC_RANGE)?,
        bind_ip: reader.read_u32_raw(layout::REPLY_BIND_IP_RANGE)?,
        bind_index: reader.read_u8(layout::REPLY_BIND_INDEX_OFFSET)?,
        status2: reader.read_u8(layout::REPLY_STATUS2_OFFSET)?,
    })
}

pub fn parse_dmx(payload: &[u8]) -> Result<ArtDmx<'_>, ArtNetError> {
    expect_opcode(payload, layout::OP_DMX)?;
    let reader = ArtNetReader::new(payload);
    reader.require_len(layout::DMX_DATA_OFFSET)?;

    let length = reader.read_u16_be(layout::DMX_LENGTH_RANGE)?;
    if length as usize > layout::DMX_MAX_SLOTS {
        return Err(ArtNetError::InvalidLength { length });
    }
    let end = layout::DMX_DATA_OFFSET + length as usize;
    reader.require_len(end)?;

    Ok(ArtDmx {
        sequence: reader.read_u8(layout::DMX_SEQUENCE_OFFSET)?,
        physical: reader.read_u8(layout::DMX_PHYSICAL_OFFSET)?,
        sub_uni: reader.read_u8(layout::DMX_SUB_UNI_OFFSET)?,
        net: reader.read_u8(layout::DMX_NET_OFFSET)?,
        data: reader.read_slice(layout::DMX_DATA_OFFSET..end)?,
    })
}

pub fn parse_sync(payload: &[u8]) -> Result<ArtSync, ArtNetError> {
    expect_opcode(payload, layout::OP_SYNC)?;
    let reader = ArtNetReader::new(payload);
    reader.require_len(layout::SYNC_LEN)?;

    Ok(ArtSync {
        aux1: reader.read_u8(layout::SYNC_AUX1_OFFSET)?,
        aux2: reader.read_u8(layout::SYNC_AUX2_OFFSET)?,
    })
}

/// Decode any supported datagram, dispatching on the header opcode.
pub fn parse_packet(payload: &[u8]) -> Result<Packet<'_>, ArtNetError> {
    // replies have no version field, so they bypass the header check
    if payload.len() >= layout::HEADER_LEN
        && payload[layout::OP_CODE_RANGE] == layout::OP_POLL_REPLY.to_ne_bytes()
    {
        return parse_poll_reply(payload).map(Packet::PollReply);
    }

    let header = parse_header(payload)?;
    match OpCode::from_u16(header.opcode) {
        Some(OpCode::Poll) => parse_poll(payload).map(Packet::Poll),
        Some(OpCode::Dmx) => parse_dmx(payload).map(Packet::Dmx),
        Some(OpCode::Sync) => parse_sync(payload).map(Packet::Sync),
        Some(OpCode::PollReply) | None => Ok(Packet::Unknown(header)),
    }
}

fn expect_opcode(payload: &[u8], expected: u16) -> Result<(), ArtNetError> {
    let header = parse_header(payload)?;
    if header.opcode != expected {
        return Err(ArtNetError::UnexpectedOpcode {
            opcode: header.opcode,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(opcode: u16, version: u16, len: usize) -> Vec<u8> {
        let mut payload = vec![0u8; len];
        payload[layout::ID_RANGE].copy_from_slice(layout::ARTNET_ID);
        payload[layout::OP_CODE_RANGE].copy_from_slice(&opcode.to_ne_bytes());
        payload[layout::VERSION_RANGE].copy_from_slice(&version.to_be_bytes());
        payload
    }

    #[test]
    fn parse_header_valid() {
        let payload = header(layout::OP_POLL, 14, layout::POLL_LEN);
        let parsed = parse_header(&payload).unwrap();
        assert_eq!(parsed.opcode, layout::OP_POLL);
        assert_eq!(parsed.version, 14);
    }

    #[test]
    fn parse_header_short() {
        let payload = header(layout::OP_POLL, 14, layout::HEADER_LEN)[..11].to_vec();
        let err = parse_header(&payload).unwrap_err();
        assert!(err.to_string().contains("payload too short"));
    }

    #[test]
    fn parse_header_bad_id() {
        let mut payload = header(layout::OP_POLL, 14, layout::POLL_LEN);
        payload[7] = b'X';
        assert_eq!(parse_header(&payload), Err(ArtNetError::InvalidId));
    }

    #[test]
    fn parse_header_old_version() {
        let payload = header(layout::OP_POLL, 13, layout::POLL_LEN);
        assert_eq!(
            parse_header(&payload),
            Err(ArtNetError::InvalidVersion { version: 13 })
        );
    }

    #[test]
    fn parse_dmx_valid() {
        let mut payload = header(layout::OP_DMX, 14, layout::DMX_DATA_OFFSET + 3);
        payload[layout::DMX_SEQUENCE_OFFSET] = 7;
        payload[layout::DMX_SUB_UNI_OFFSET] = 0x12;
        payload[layout::DMX_NET_OFFSET] = 0x01;
        payload[layout::DMX_LENGTH_RANGE].copy_from_slice(&3u16.to_be_bytes());
        payload[layout::DMX_DATA_OFFSET..].copy_from_slice(&[10, 20, 30]);

        let dmx = parse_dmx(&payload).unwrap();
        assert_eq!(dmx.sequence, 7);
        assert_eq!(dmx.address(), 0x0112);
        assert_eq!(dmx.data, &[10, 20, 30]);
    }

    #[test]
    fn parse_dmx_rejects_oversized_length() {
        let mut payload = header(layout::OP_DMX, 14, layout::DMX_DATA_OFFSET);
        payload[layout::DMX_LENGTH_RANGE].copy_from_slice(&513u16.to_be_bytes());
        assert_eq!(
            parse_dmx(&payload),
            Err(ArtNetError::InvalidLength { length: 513 })
        );
    }

    #[test]
    fn parse_dmx_rejects_truncated_data() {
        let mut payload = header(layout::OP_DMX, 14, layout::DMX_DATA_OFFSET + 2);
        payload[layout::DMX_LENGTH_RANGE].copy_from_slice(&4u16.to_be_bytes());
        let err = parse_dmx(&payload).unwrap_err();
        assert!(matches!(err, ArtNetError::TooShort { needed: 22, .. }));
    }

    #[test]
    fn parse_sync_short_payload() {
        let payload = header(layout::OP_SYNC, 14, layout::SYNC_LEN - 1);
        assert!(matches!(
            parse_sync(&payload),
            Err(ArtNetError::TooShort { .. })
        ));
    }

    #[test]
    fn parse_packet_unknown_opcode() {
        let payload = header(0x8000, 14, layout::HEADER_LEN);
        let packet = parse_packet(&payload).unwrap();
        assert_eq!(
            packet,
            Packet::Unknown(Header {
                opcode: 0x8000,
                version: 14
            })
        );
    }

    #[test]
    fn parse_poll_wrong_opcode() {
        let payload = header(layout::OP_SYNC, 14, layout::POLL_LEN);
        assert_eq!(
            parse_poll(&payload),
            Err(ArtNetError::UnexpectedOpcode {
                opcode: layout::OP_SYNC
            })
        );
    }
}
