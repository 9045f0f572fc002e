use std::net::SocketAddr;

use tracing::{debug, warn};

use super::Node;
use super::error::PacketError;
use crate::address::{address_universe, same_net_subnet};
use crate::protocols::artnet::layout::{
    GOOD_INPUT_DATA_RECEIVED, GOOD_OUTPUT_TRANSMITTING, POLL_REPLY_BIND_INDEX_MAX,
    POLL_REPLY_PORTS, PORT_TYPE_DMX, PORT_TYPE_INPUT, PORT_TYPE_OUTPUT, STATUS2_ARTNET3_SUPPORT,
    STATUS2_DHCP_SUPPORT,
};
use crate::protocols::artnet::{ArtPollReply, encode_poll_reply};

impl Node {
    /// Build the ArtPollReply set describing this node.
    ///
    /// Ports are reported in banks of four; each bank shares one net +
    /// sub-net and gets its own reply, numbered through `bind_index`.
    pub fn poll_replies(&self) -> Vec<ArtPollReply> {
        let options = self.options.read();
        let metadata = &options.metadata;

        let inputs: Vec<_> = self.inputs.iter().collect();
        let outputs: Vec<_> = self.outputs.iter().filter(|o| o.discoverable).collect();

        let mut replies = Vec::new();
        let (mut i, mut o) = (0, 0);

        while i < inputs.len() || o < outputs.len() {
            if replies.len() >= POLL_REPLY_BIND_INDEX_MAX {
                warn!(replies = replies.len(), "too many ports for poll replies");
                self.count(|stats| &mut stats.poll_reply_overflow);
                break;
            }

            let reference = match outputs.get(o) {
                Some(output) => output.options.address,
                None => inputs[i].options.address,
            };

            let mut reply = ArtPollReply {
                ip_address: metadata.ip_address,
                port_number: options.port,
                version_info: 0,
                net_switch: ((reference & 0x7f00) >> 8) as u8,
                sub_switch: ((reference >> 4) & 0xf) as u8,
                short_name: metadata.short_name.clone(),
                long_name: metadata.long_name.clone(),
                num_ports: 0,
                port_types: [PORT_TYPE_DMX; POLL_REPLY_PORTS],
                good_input: [0; POLL_REPLY_PORTS],
                good_output: [0; POLL_REPLY_PORTS],
                sw_in: [0; POLL_REPLY_PORTS],
                sw_out: [0; POLL_REPLY_PORTS],
                mac: metadata.mac_address,
                bind_ip: 0,
                bind_index: replies.len() as u8,
                status2: STATUS2_ARTNET3_SUPPORT | STATUS2_DHCP_SUPPORT,
            };

            let mut input_ports = 0;
            while input_ports < POLL_REPLY_PORTS
                && i < inputs.len()
                && same_net_subnet(inputs[i].options.address, reference)
            {
                let input = inputs[i];
                reply.port_types[input_ports] |= PORT_TYPE_INPUT;
                if input.has_data() {
                    reply.good_input[input_ports] |= GOOD_INPUT_DATA_RECEIVED;
                }
                reply.sw_in[input_ports] = address_universe(input.options.address) as u8;
                input_ports += 1;
                i += 1;
            }

            let mut output_ports = 0;
            while output_ports < POLL_REPLY_PORTS
                && o < outputs.len()
                && same_net_subnet(outputs[o].options.address, reference)
            {
                let output = outputs[o];
                reply.port_types[output_ports] |= PORT_TYPE_OUTPUT;
                reply.good_output[output_ports] |= GOOD_OUTPUT_TRANSMITTING;
                reply.sw_out[output_ports] = address_universe(output.options.address) as u8;
                output_ports += 1;
                o += 1;
            }

            reply.num_ports = input_ports.max(output_ports) as u16;
            replies.push(reply);
        }
        replies
    }

    /// Answer an ArtPoll from `to` with one datagram per reply.
    pub(super) fn reply_poll(&self, to: SocketAddr) -> Result<(), PacketError> {
        let replies = self.poll_replies();
        debug!(%to, replies = replies.len(), "poll reply");

        for reply in &replies {
            let packet = encode_poll_reply(reply);
            self.transport.send_to(&packet, to)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::clock::ManualClock;
    use crate::node::{InputPortOptions, NodeOptions, OutputPortOptions};
    use crate::protocols::artnet::layout::{
        GOOD_INPUT_DATA_RECEIVED, PORT_TYPE_INPUT, PORT_TYPE_OUTPUT,
    };
    use crate::testing::NullTransport;
    use crate::{DmxFrame, Node};

    fn node(address: u16) -> Node {
        let options = NodeOptions {
            address,
            inputs: 4,
            ..NodeOptions::default()
        };
        Node::with_transport(options, NullTransport, Arc::new(ManualClock::new(0))).unwrap()
    }

    #[test]
    fn empty_node_has_no_replies() {
        assert!(node(0).poll_replies().is_empty());
    }

    #[test]
    fn inputs_and_outputs_share_bank_slots() {
        let mut node = node(0x0230);
        let input = node
            .add_input_port(InputPortOptions {
                port: 0,
                index: 0,
                address: 0x0235,
            })
            .unwrap();
        node.add_output_port(OutputPortOptions::new(0, 0, 0x0231)).unwrap();
        node.add_output_port(OutputPortOptions::new(1, 1, 0x0232)).unwrap();
        node.submit_input(input, &DmxFrame::new(0, &[1]).unwrap());

        let replies = node.poll_replies();
        assert_eq!(replies.len(), 1);
        let reply = &replies[0];
        assert_eq!(reply.net_switch, 0x02);
        assert_eq!(reply.sub_switch, 0x03);
        assert_eq!(reply.num_ports, 2);
        assert_eq!(reply.port_types[0], PORT_TYPE_INPUT | PORT_TYPE_OUTPUT);
        assert_eq!(reply.port_types[1], PORT_TYPE_OUTPUT);
        assert_eq!(reply.good_input[0] & 0x80, 0x80);
        assert_eq!(reply.sw_in[0], 5);
        assert_eq!(&reply.sw_out[..2], &[1, 2]);
        assert_eq!(reply.port_number, 6454);
    }

    #[test]
    fn input_data_flag_survives_stats_reset() {
        let mut node = node(0x0100);
        let input = node
            .add_input_port(InputPortOptions {
                port: 0,
                index: 0,
                address: 0x0101,
            })
            .unwrap();
        assert_eq!(node.poll_replies()[0].good_input[0], 0);

        node.submit_input(input, &DmxFrame::new(0, &[1]).unwrap());
        node.reset_stats();
        assert_eq!(node.input_stats(0).unwrap().dmx_recv.count, 0);
        assert_eq!(node.poll_replies()[0].good_input[0], GOOD_INPUT_DATA_RECEIVED);
    }

    #[test]
    fn undiscoverable_outputs_are_skipped() {
        let mut node = node(0x0010);
        node.add_output_port(OutputPortOptions::new(4, 0, 0x0011)).unwrap();
        node.add_output_port(OutputPortOptions::new(0, 1, 0x0021)).unwrap();
        assert!(node.poll_replies().is_empty());
        assert_eq!(node.output_count(), 2);
    }
}
