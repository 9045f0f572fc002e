//! Art-Net protocol encoding and decoding.
//!
//! The codec covers the packets a node exchanges: ArtPoll, ArtPollReply,
//! ArtDmx and ArtSync. Every packet starts with the `Art-Net\0` id and an
//! opcode. The opcode (and a few other 16-bit fields) travel as the sender's
//! raw `u16`, while the protocol version and lengths travel in network byte
//! order; `reader`/`writer` expose one accessor per convention and `layout`
//! records which field uses which.
//!
//! Headers with a version below 14 are rejected, as are ArtDmx payloads longer
//! than 512 slots or shorter than their declared length.

pub mod encoder;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use encoder::{encode_dmx, encode_poll, encode_poll_reply, encode_sync};
pub use error::ArtNetError;
pub use parser::{
    ArtDmx, ArtPoll, ArtPollReply, ArtSync, Header, OpCode, Packet, parse_dmx, parse_header,
    parse_packet, parse_poll, parse_poll_reply, parse_sync,
};
