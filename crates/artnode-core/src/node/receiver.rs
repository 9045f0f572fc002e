use std::net::SocketAddr;

use tracing::{debug, info, trace, warn};

use super::Node;
use super::error::PacketError;
use crate::dmx::DmxFrame;
use crate::protocols::artnet::layout::PACKET_SIZE_MAX;
use crate::protocols::artnet::{OpCode, parse_dmx, parse_header, parse_poll, parse_sync};

impl Node {
    /// Receive and handle one datagram from the transport.
    ///
    /// Transport errors are counted and returned; handler errors are counted
    /// and logged only.
    pub fn receive_once(&self, buf: &mut [u8]) -> Result<(), PacketError> {
        let (len, from) = match self.transport.recv_from(buf) {
            Ok(received) => received,
            Err(err) => {
                warn!(%err, "recv");
                self.count(|stats| &mut stats.recv_error);
                return Err(err.into());
            }
        };

        if let Err(err) = self.handle_datagram(&buf[..len], from) {
            debug!(%from, %err, "packet");
        }
        Ok(())
    }

    /// Dispatch one Art-Net datagram received from `from`.
    pub fn handle_datagram(&self, data: &[u8], from: SocketAddr) -> Result<(), PacketError> {
        let header = match parse_header(data) {
            Ok(header) => header,
            Err(err) => {
                trace!(%from, len = data.len(), %err, "invalid header");
                self.count(|stats| &mut stats.recv_invalid);
                return Err(err.into());
            }
        };

        let result = match OpCode::from_u16(header.opcode) {
            Some(OpCode::Poll) => {
                self.count(|stats| &mut stats.recv_poll);
                self.handle_poll(data, from)
            }
            Some(OpCode::Dmx) => {
                self.count(|stats| &mut stats.recv_dmx);
                self.handle_dmx(data)
            }
            Some(OpCode::Sync) => {
                self.count(|stats| &mut stats.recv_sync);
                self.handle_sync_packet(data)
            }
            _ => {
                trace!(%from, opcode = format_args!("{:#06x}", header.opcode), "unknown opcode");
                self.count(|stats| &mut stats.recv_unknown);
                Ok(())
            }
        };

        if let Err(err) = &result {
            warn!(%from, opcode = format_args!("{:#06x}", header.opcode), %err, "handle packet");
            self.count(|stats| &mut stats.errors);
        }
        result
    }

    /// Run the network receive loop. Never returns.
    pub fn listen_main(&self) {
        info!(port = self.options.read().port, "listen main");
        let mut buf = [0u8; PACKET_SIZE_MAX];
        loop {
            // failures are counted in stats
            let _ = self.receive_once(&mut buf);
        }
    }

    fn handle_poll(&self, data: &[u8], from: SocketAddr) -> Result<(), PacketError> {
        let poll = parse_poll(data)?;
        debug!(%from, ttm = poll.ttm, priority = poll.priority, "poll");
        self.reply_poll(from)
    }

    fn handle_dmx(&self, data: &[u8]) -> Result<(), PacketError> {
        let dmx = parse_dmx(data)?;
        trace!(
            address = format_args!("{:#06x}", dmx.address()),
            seq = dmx.sequence,
            len = dmx.data.len(),
            "dmx"
        );
        self.route_dmx(dmx.address(), &DmxFrame::from(&dmx));
        Ok(())
    }

    fn handle_sync_packet(&self, data: &[u8]) -> Result<(), PacketError> {
        parse_sync(data)?;
        self.handle_sync();
        Ok(())
    }
}
