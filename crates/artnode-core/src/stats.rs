//! Event counters and per-port statistics snapshots.

use serde::{Deserialize, Serialize};

/// Event count plus the clock time of the most recent event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCounter {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ms: Option<u64>,
}

impl StatsCounter {
    pub fn increment(&mut self, now_ms: u64) {
        self.count += 1;
        self.last_ms = Some(now_ms);
    }

    /// Milliseconds since the last event, if any.
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_ms.map(|last| now_ms.saturating_sub(last))
    }
}

/// Receiver statistics for the whole node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub recv_poll: StatsCounter,
    pub recv_dmx: StatsCounter,
    pub recv_sync: StatsCounter,
    pub recv_unknown: StatsCounter,
    /// Transport read failures.
    pub recv_error: StatsCounter,
    /// Datagrams with a bad id, version or header length.
    pub recv_invalid: StatsCounter,
    /// DMX frames for an address with no output port.
    pub dmx_discard: StatsCounter,
    /// Poll replies not sent because the bind index ran out.
    pub poll_reply_overflow: StatsCounter,
    /// Per-packet handler failures, including send errors.
    pub errors: StatsCounter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStats {
    pub sync_recv: StatsCounter,
    pub dmx_recv: StatsCounter,
    /// Frames accepted while the node was in sync mode.
    pub dmx_sync: StatsCounter,
    pub seq_skip: StatsCounter,
    pub seq_drop: StatsCounter,
    pub seq_resync: StatsCounter,
    pub queue_overwrite: StatsCounter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStats {
    pub dmx_recv: StatsCounter,
    pub queue_overwrite: StatsCounter,
}
