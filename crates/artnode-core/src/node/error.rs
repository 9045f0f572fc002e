use thiserror::Error;

use crate::protocols::artnet::ArtNetError;

/// Configuration and port registration errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("base address {address:#06x} has non-zero universe bits")]
    InvalidAddress { address: u16 },
    #[error("requested {requested} input ports, maximum is {max}")]
    TooManyInputs { requested: usize, max: usize },
    #[error("requested {requested} output ports, maximum is {max}")]
    TooManyOutputs { requested: usize, max: usize },
    #[error("all {capacity} input ports are in use")]
    InputsFull { capacity: usize },
    #[error("all {capacity} output ports are in use")]
    OutputsFull { capacity: usize },
    #[error("port address {address:#06x} does not match node net/sub-net {base:#06x}")]
    AddressMismatch { address: u16, base: u16 },
    #[error("output index {index} exceeds notification bits (max {max})")]
    InvalidIndex { index: u8, max: usize },
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Failure handling a single datagram; the receive loop continues.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ArtNetError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
