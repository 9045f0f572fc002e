//! Art-Net node: port registry, routing and the two runtime loops.
//!
//! A node is opened from [`NodeOptions`], ports are registered with
//! `add_input_port` / `add_output_port` while the node is still exclusively
//! owned, and then the node is shared (typically in an `Arc`) between the
//! receive loop ([`Node::listen_main`]) and the input aggregation loop
//! ([`Node::inputs_main`]). Registration takes `&mut self`, so ports cannot be
//! added once either loop is running.
//!
//! Output port sequence state is guarded per port, so the network and local
//! inputs may target the same address concurrently.

mod config;
mod discovery;
mod error;
mod inputs;
mod outputs;
mod receiver;

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::address::UNIVERSE_MASK;
use crate::clock::{Clock, SystemClock};
use crate::notify::EventGroup;
use crate::stats::{NodeStats, StatsCounter};
use crate::transport::{Transport, UdpTransport};

pub use config::{
    INPUT_PORTS_MAX, InputPortOptions, InputState, Metadata, NodeOptions, OUTPUT_PORTS_MAX,
    OutputPortOptions, OutputState, PORT_BANK_SIZE,
};
pub use error::{NodeError, PacketError};
pub use inputs::InputHandle;
pub use outputs::{
    OutputHandle, OutputQueue, SEQ_RESYNC_TIMEOUT_MS, SYNC_MODE_TIMEOUT_MS, SeqOutcome,
    check_sequence, next_seq,
};

use inputs::InputPort;
use outputs::OutputPort;

pub struct Node {
    options: RwLock<NodeOptions>,
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    // one index bit per input port, consumed by the aggregation loop
    input_events: EventGroup,
    // clock time of the last ArtSync
    sync_ms: Mutex<Option<u64>>,
    stats: Mutex<NodeStats>,
}

/// Validate `options`, bind the UDP listen port and create the node.
pub fn open_node(options: NodeOptions) -> Result<Node, NodeError> {
    validate_options(&options)?;

    let transport = UdpTransport::bind(options.port).map_err(|source| {
        error!(port = options.port, %source, "bind failed");
        NodeError::Bind {
            port: options.port,
            source,
        }
    })?;

    Node::with_transport(options, transport, Arc::new(SystemClock::new()))
}

pub fn validate_options(options: &NodeOptions) -> Result<(), NodeError> {
    if options.address & UNIVERSE_MASK != 0 {
        error!(address = options.address, "base address has universe bits set");
        return Err(NodeError::InvalidAddress {
            address: options.address,
        });
    }
    if options.inputs > INPUT_PORTS_MAX {
        error!(inputs = options.inputs, "too many inputs");
        return Err(NodeError::TooManyInputs {
            requested: options.inputs,
            max: INPUT_PORTS_MAX,
        });
    }
    if options.outputs > OUTPUT_PORTS_MAX {
        error!(outputs = options.outputs, "too many outputs");
        return Err(NodeError::TooManyOutputs {
            requested: options.outputs,
            max: OUTPUT_PORTS_MAX,
        });
    }
    Ok(())
}

impl Node {
    /// Create a node on an already-open transport.
    pub fn with_transport<T>(
        options: NodeOptions,
        transport: T,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError>
    where
        T: Transport + 'static,
    {
        validate_options(&options)?;

        let metadata = &options.metadata;
        if metadata.short_name.len() > 17 || metadata.long_name.len() > 63 {
            warn!("node names will be truncated in poll replies");
        }

        info!(
            port = options.port,
            address = format_args!("{:#06x}", options.address),
            inputs = options.inputs,
            outputs = options.outputs,
            "node open"
        );

        Ok(Self {
            inputs: Vec::with_capacity(options.inputs),
            outputs: Vec::with_capacity(options.outputs),
            options: RwLock::new(options),
            transport: Box::new(transport),
            clock,
            input_events: EventGroup::new(),
            sync_ms: Mutex::new(None),
            stats: Mutex::new(NodeStats::default()),
        })
    }

    pub fn options(&self) -> NodeOptions {
        self.options.read().clone()
    }

    /// Base net + sub-net address.
    pub fn address(&self) -> u16 {
        self.options.read().address
    }

    /// Address the transport is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Replace the discovery metadata. The listen port cannot be changed.
    pub fn set_metadata(&self, metadata: Metadata) {
        self.options.write().metadata = metadata;
    }

    pub fn stats(&self) -> NodeStats {
        *self.stats.lock()
    }

    /// Zero node, input and output statistics.
    pub fn reset_stats(&self) {
        *self.stats.lock() = NodeStats::default();
        for input in &self.inputs {
            input.reset_stats();
        }
        for output in &self.outputs {
            output.reset_stats();
        }
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub(crate) fn count(&self, select: impl FnOnce(&mut NodeStats) -> &mut StatsCounter) {
        let now = self.now_ms();
        let mut stats = self.stats.lock();
        select(&mut *stats).increment(now);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("options", &*self.options.read())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}
