use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::notify::EventGroup;
use crate::protocols::artnet::layout::ARTNET_PORT;

/// Maximum number of input ports per node.
pub const INPUT_PORTS_MAX: usize = 16;
/// Maximum number of output ports per node.
pub const OUTPUT_PORTS_MAX: usize = 16;
/// Physical ports advertised per poll reply.
pub const PORT_BANK_SIZE: u8 = 4;

/// Node configuration.
///
/// # Examples
/// ```
/// use artnode_core::NodeOptions;
///
/// let options: NodeOptions = serde_json::from_str(r#"{ "address": 256, "outputs": 4 }"#).unwrap();
/// assert_eq!(options.port, 6454);
/// assert_eq!(options.inputs, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOptions {
    /// UDP listen port.
    pub port: u16,
    /// Net + sub-net shared by all ports; the universe bits must be zero.
    pub address: u16,
    /// Discovery metadata reported in poll replies.
    pub metadata: Metadata,
    /// Input port capacity.
    pub inputs: usize,
    /// Output port capacity.
    pub outputs: usize,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            port: ARTNET_PORT,
            address: 0,
            metadata: Metadata::default(),
            inputs: 0,
            outputs: OUTPUT_PORTS_MAX,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub ip_address: [u8; 4],
    pub mac_address: [u8; 6],
    /// Up to 17 bytes are sent.
    pub short_name: String,
    /// Up to 63 bytes are sent.
    pub long_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPortOptions {
    /// Physical port 0-3.
    pub port: u8,
    /// Caller-chosen index used for discovery and status display.
    pub index: u8,
    /// Full address; net + sub-net must match the node.
    pub address: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPortOptions {
    /// Physical port 0-3; higher ports work but are not discoverable.
    pub port: u8,
    /// Bit set on `event_group` when a frame is queued, 0-15.
    pub index: u8,
    /// Full address; a different net + sub-net is not discoverable.
    pub address: u16,
    /// Notification bits shared with the consumer driving this port.
    #[serde(skip)]
    pub event_group: Option<Arc<EventGroup>>,
}

impl OutputPortOptions {
    pub fn new(port: u8, index: u8, address: u16) -> Self {
        Self {
            port,
            index,
            address,
            event_group: None,
        }
    }

    pub fn with_event_group(mut self, event_group: Arc<EventGroup>) -> Self {
        self.event_group = Some(event_group);
        self
    }
}

/// Input port state for status queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    /// Clock time of the last submitted frame.
    pub last_ms: Option<u64>,
    /// Length of the last submitted frame.
    pub len: u16,
}

/// Output port sequence state for status queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    /// Clock time of the last accepted frame.
    pub last_ms: u64,
    /// Last accepted sequence number, 0 before any sequenced frame.
    pub seq: u8,
}
