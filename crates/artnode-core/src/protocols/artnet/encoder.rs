use super::error::ArtNetError;
use super::layout;
use super::parser::{ArtDmx, ArtPoll, ArtPollReply, ArtSync};
use super::writer::ArtNetWriter;

fn header(len: usize, opcode: u16) -> ArtNetWriter {
    let mut writer = ArtNetWriter::new(len, opcode);
    writer.write_u16_be(layout::VERSION_RANGE, layout::ARTNET_VERSION);
    writer
}

pub fn encode_poll(poll: &ArtPoll) -> Vec<u8> {
    let mut writer = header(layout::POLL_LEN, layout::OP_POLL);
    writer.write_u8(layout::POLL_TTM_OFFSET, poll.ttm);
    writer.write_u8(layout::POLL_PRIORITY_OFFSET, poll.priority);
    writer.finish()
}

pub fn encode_poll_reply(reply: &ArtPollReply) -> Vec<u8> {
    let mut writer = ArtNetWriter::new(layout::POLL_REPLY_LEN, layout::OP_POLL_REPLY);
    writer.write_slice(layout::REPLY_IP_RANGE, &reply.ip_address);
    writer.write_u16_raw(layout::REPLY_PORT_RANGE, reply.port_number);
    writer.write_u16_be(layout::REPLY_VERSION_INFO_RANGE, reply.version_info);
    writer.write_u8(layout::REPLY_NET_SWITCH_OFFSET, reply.net_switch);
    writer.write_u8(layout::REPLY_SUB_SWITCH_OFFSET, reply.sub_switch);
    writer.write_cstr(layout::REPLY_SHORT_NAME_RANGE, &reply.short_name);
    writer.write_cstr(layout::REPLY_LONG_NAME_RANGE, &reply.long_name);
    writer.write_u16_be(layout::REPLY_NUM_PORTS_RANGE, reply.num_ports);
    writer.write_slice(layout::REPLY_PORT_TYPES_RANGE, &reply.port_types);
    writer.write_slice(layout::REPLY_GOOD_INPUT_RANGE, &reply.good_input);
    writer.write_slice(layout::REPLY_GOOD_OUTPUT_RANGE, &reply.good_output);
    writer.write_slice(layout::REPLY_SW_IN_RANGE, &reply.sw_in);
    writer.write_slice(layout::REPLY_SW_OUT_RANGE, &reply.sw_out);
    writer.write_slice(layout::REPLY_MAC_RANGE, &reply.mac);
    writer.write_u32_raw(layout::REPLY_BIND_IP_RANGE, reply.bind_ip);
    writer.write_u8(layout::REPLY_BIND_INDEX_OFFSET, reply.bind_index);
    writer.write_u8(layout::REPLY_STATUS2_OFFSET, reply.status2);
    writer.finish()
}

pub fn encode_dmx(dmx: &ArtDmx<'_>) -> Result<Vec<u8>, ArtNetError> {
    let length = dmx.data.len();
    if length > layout::DMX_MAX_SLOTS {
        return Err(ArtNetError::InvalidLength {
            length: u16::try_from(length).unwrap_or(u16::MAX),
        });
    }

    let mut writer = header(layout::DMX_DATA_OFFSET + length, layout::OP_DMX);
    writer.write_u8(layout::DMX_SEQUENCE_OFFSET, dmx.sequence);
    writer.write_u8(layout::DMX_PHYSICAL_OFFSET, dmx.physical);
    writer.write_u8(layout::DMX_SUB_UNI_OFFSET, dmx.sub_uni);
    writer.write_u8(layout::DMX_NET_OFFSET, dmx.net);
    writer.write_u16_be(layout::DMX_LENGTH_RANGE, length as u16);
    writer.write_slice(layout::DMX_DATA_OFFSET..layout::DMX_DATA_OFFSET + length, dmx.data);
    Ok(writer.finish())
}

pub fn encode_sync(sync: &ArtSync) -> Vec<u8> {
    let mut writer = header(layout::SYNC_LEN, layout::OP_SYNC);
    writer.write_u8(layout::SYNC_AUX1_OFFSET, sync.aux1);
    writer.write_u8(layout::SYNC_AUX2_OFFSET, sync.aux2);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::artnet::parser::{Packet, parse_packet};

    #[test]
    fn dmx_wire_layout() {
        let data = [1u8, 2, 3, 4];
        let dmx = ArtDmx {
            sequence: 9,
            physical: 0,
            sub_uni: 0x21,
            net: 0x03,
            data: &data,
        };
        let buf = encode_dmx(&dmx).unwrap();
        assert_eq!(buf.len(), layout::DMX_DATA_OFFSET + 4);
        // version and length are network order
        assert_eq!(&buf[layout::VERSION_RANGE], &[0x00, 0x0e]);
        assert_eq!(&buf[layout::DMX_LENGTH_RANGE], &[0x00, 0x04]);
        assert_eq!(&buf[layout::OP_CODE_RANGE], &layout::OP_DMX.to_ne_bytes());
        assert_eq!(buf[layout::DMX_SUB_UNI_OFFSET], 0x21);
        assert_eq!(buf[layout::DMX_NET_OFFSET], 0x03);
    }

    #[test]
    fn dmx_round_trip_keeps_address() {
        let data = [0xffu8; 512];
        let dmx = ArtDmx {
            sequence: 255,
            physical: 2,
            sub_uni: 0x0f,
            net: 0x7f,
            data: &data,
        };
        let buf = encode_dmx(&dmx).unwrap();
        let Packet::Dmx(parsed) = parse_packet(&buf).unwrap() else {
            panic!("expected ArtDmx");
        };
        assert_eq!(parsed, dmx);
        assert_eq!(parsed.address(), 0x7f0f);
    }

    #[test]
    fn dmx_rejects_oversized_data() {
        let data = [0u8; 513];
        let dmx = ArtDmx {
            sequence: 0,
            physical: 0,
            sub_uni: 0,
            net: 0,
            data: &data,
        };
        assert_eq!(
            encode_dmx(&dmx),
            Err(ArtNetError::InvalidLength { length: 513 })
        );
    }

    #[test]
    fn poll_reply_round_trip() {
        let reply = ArtPollReply {
            ip_address: [192, 168, 1, 20],
            port_number: layout::ARTNET_PORT,
            version_info: 0x0102,
            net_switch: 1,
            sub_switch: 2,
            short_name: "node".to_string(),
            long_name: "lighting node".to_string(),
            num_ports: 2,
            port_types: [0xc0, 0x80, 0, 0],
            good_input: [layout::GOOD_INPUT_DATA_RECEIVED, 0, 0, 0],
            good_output: [layout::GOOD_OUTPUT_TRANSMITTING; 4],
            sw_in: [3, 0, 0, 0],
            sw_out: [3, 4, 0, 0],
            mac: [0x02, 0, 0, 0, 0, 0x01],
            bind_ip: 0,
            bind_index: 7,
            status2: layout::STATUS2_ARTNET3_SUPPORT,
        };
        let buf = encode_poll_reply(&reply);
        assert_eq!(buf.len(), layout::POLL_REPLY_LEN);
        assert_eq!(&buf[layout::REPLY_NUM_PORTS_RANGE], &[0x00, 0x02]);
        assert_eq!(
            &buf[layout::REPLY_PORT_RANGE],
            &layout::ARTNET_PORT.to_ne_bytes()
        );
        assert_eq!(parse_packet(&buf).unwrap(), Packet::PollReply(reply));
    }

    #[test]
    fn poll_reply_truncates_long_names() {
        let reply = ArtPollReply {
            ip_address: [0; 4],
            port_number: 0,
            version_info: 0,
            net_switch: 0,
            sub_switch: 0,
            short_name: "x".repeat(40),
            long_name: String::new(),
            num_ports: 0,
            port_types: [0; 4],
            good_input: [0; 4],
            good_output: [0; 4],
            sw_in: [0; 4],
            sw_out: [0; 4],
            mac: [0; 6],
            bind_ip: 0,
            bind_index: 0,
            status2: 0,
        };
        let buf = encode_poll_reply(&reply);
        let Packet::PollReply(parsed) = parse_packet(&buf).unwrap() else {
            panic!("expected ArtPollReply");
        };
        assert_eq!(parsed.short_name.len(), 17);
    }

    #[test]
    fn poll_and_sync_round_trip() {
        let poll = ArtPoll {
            ttm: 0x06,
            priority: 0x10,
        };
        assert_eq!(parse_packet(&encode_poll(&poll)).unwrap(), Packet::Poll(poll));

        let sync = ArtSync { aux1: 1, aux2: 2 };
        assert_eq!(parse_packet(&encode_sync(&sync)).unwrap(), Packet::Sync(sync));
    }
}
