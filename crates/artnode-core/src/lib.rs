//! Art-Net node core: protocol codec, port registry and DMX routing.
//!
//! The crate turns Art-Net datagrams into DMX frames delivered to local
//! output ports, and local input frames into the same output path. The
//! layers, bottom up:
//! - `protocols::artnet`: byte-level codec (layout/reader/writer/parser/encoder)
//! - `queue` and `notify`: single-slot mailboxes and latched event bits
//! - `Node`: port registry, sequence checking, sync mode, discovery replies
//!   and the two runtime loops
//!
//! All network I/O goes through the [`Transport`] trait and all time through
//! the [`Clock`] trait, so the node can be driven deterministically in tests.
//!
//! Invariants:
//! - An output port never accepts a frame that is older than its last
//!   accepted frame, except after 5 s of silence.
//! - Producers never block: a full queue slot is overwritten and counted.
//! - A frame is marked sync-mode iff an ArtSync arrived within the last 4 s.
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//! use std::thread;
//!
//! use artnode_core::{NodeOptions, OutputPortOptions, open_node};
//!
//! let mut node = open_node(NodeOptions {
//!     address: 0x0010,
//!     outputs: 1,
//!     ..NodeOptions::default()
//! })?;
//! let output = node.add_output_port(OutputPortOptions::new(0, 0, 0x0011))?;
//! let queue = node.output_queue(output.index()).expect("registered output");
//!
//! let node = Arc::new(node);
//! let listener = Arc::clone(&node);
//! thread::spawn(move || listener.listen_main());
//!
//! while let Some(frame) = queue.read(None) {
//!     println!("{} slots, sync={}", frame.len(), frame.sync_mode);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod address;
pub mod notify;
pub mod protocols;
pub mod queue;
pub mod stats;
pub mod transport;

mod clock;
mod dmx;
mod node;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dmx::DmxFrame;
pub use node::{
    INPUT_PORTS_MAX, InputHandle, InputPortOptions, InputState, Metadata, Node, NodeError,
    NodeOptions, OUTPUT_PORTS_MAX, OutputHandle, OutputPortOptions, OutputQueue, OutputState,
    PORT_BANK_SIZE, PacketError, SEQ_RESYNC_TIMEOUT_MS, SYNC_MODE_TIMEOUT_MS, SeqOutcome,
    check_sequence, next_seq, open_node, validate_options,
};
pub use notify::{EventGroup, FLAG_BITS, INDEX_BITS, INDEX_MAX, SYNC_BIT, TEST_BIT};
pub use stats::{InputStats, NodeStats, OutputStats, StatsCounter};
pub use transport::{Transport, UdpTransport};
