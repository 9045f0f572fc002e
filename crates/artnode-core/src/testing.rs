use std::io;
use std::net::SocketAddr;

use crate::transport::Transport;

/// Transport that never receives and discards everything sent.
pub(crate) struct NullTransport;

impl Transport for NullTransport {
    fn recv_from(&self, _buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        Err(io::ErrorKind::WouldBlock.into())
    }

    fn send_to(&self, buf: &[u8], _addr: SocketAddr) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Err(io::ErrorKind::Unsupported.into())
    }
}
