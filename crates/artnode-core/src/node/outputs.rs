use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::config::{OutputPortOptions, OutputState, PORT_BANK_SIZE};
use super::error::NodeError;
use super::Node;
use crate::address::same_net_subnet;
use crate::dmx::DmxFrame;
use crate::notify::{EventGroup, INDEX_MAX, SYNC_BIT, TEST_BIT, index_bit};
use crate::queue::Mailbox;
use crate::stats::OutputStats;

/// Silence after which an out-of-order sequence number is adopted.
pub const SEQ_RESYNC_TIMEOUT_MS: u64 = 5000;
/// Frames received within this long after an ArtSync are in sync mode.
pub const SYNC_MODE_TIMEOUT_MS: u64 = 4000;

/// Result of checking a frame's sequence number against an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqOutcome {
    /// Sequencing disabled by the sender, or first frame on the port.
    Unsequenced,
    InOrder,
    /// Accepted after a gap.
    Skipped,
    /// Stale sequence number accepted after a period of silence.
    Resynced,
    Dropped,
}

impl SeqOutcome {
    pub fn is_accepted(self) -> bool {
        self != Self::Dropped
    }
}

/// Successor in the 1..=255 sequence range; 0 is reserved.
pub fn next_seq(seq: u8) -> u8 {
    if seq == u8::MAX { 1 } else { seq + 1 }
}

/// Decide whether a frame with sequence `seq` is accepted by a port whose
/// last accepted sequence is `prev`, `elapsed_ms` after its last accept.
///
/// # Examples
/// ```
/// use artnode_core::{SeqOutcome, check_sequence};
///
/// assert_eq!(check_sequence(255, 1, 0), SeqOutcome::InOrder);
/// assert_eq!(check_sequence(10, 10, 100), SeqOutcome::Dropped);
/// assert_eq!(check_sequence(10, 5, 6000), SeqOutcome::Resynced);
/// ```
pub fn check_sequence(prev: u8, seq: u8, elapsed_ms: u64) -> SeqOutcome {
    if seq == 0 || prev == 0 {
        SeqOutcome::Unsequenced
    } else if seq == next_seq(prev) {
        SeqOutcome::InOrder
    } else if seq > prev || prev - seq >= 128 {
        SeqOutcome::Skipped
    } else if elapsed_ms > SEQ_RESYNC_TIMEOUT_MS {
        SeqOutcome::Resynced
    } else {
        SeqOutcome::Dropped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputHandle(pub(super) usize);

impl OutputHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Consumer side of an output port's single-slot queue.
#[derive(Debug, Clone)]
pub struct OutputQueue {
    mailbox: Arc<Mailbox<DmxFrame>>,
}

impl OutputQueue {
    /// Wait up to `timeout` for the next frame; `None` waits indefinitely.
    pub fn read(&self, timeout: Option<Duration>) -> Option<DmxFrame> {
        self.mailbox.take_timeout(timeout)
    }

    pub fn try_read(&self) -> Option<DmxFrame> {
        self.mailbox.try_take()
    }
}

#[derive(Debug, Default)]
struct OutputStatus {
    state: OutputState,
    stats: OutputStats,
}

#[derive(Debug)]
pub(super) struct OutputPort {
    pub(super) options: OutputPortOptions,
    pub(super) discoverable: bool,
    queue: Arc<Mailbox<DmxFrame>>,
    status: Mutex<OutputStatus>,
}

impl OutputPort {
    fn new(options: OutputPortOptions, discoverable: bool) -> Self {
        Self {
            options,
            discoverable,
            queue: Arc::new(Mailbox::new()),
            status: Mutex::new(OutputStatus::default()),
        }
    }

    fn accept(&self, frame: &DmxFrame, now: u64, sync_mode: bool) -> SeqOutcome {
        let mut status = self.status.lock();
        status.stats.dmx_recv.increment(now);

        let prev = status.state.seq;
        let elapsed = now.saturating_sub(status.state.last_ms);
        let outcome = check_sequence(prev, frame.seq, elapsed);

        match outcome {
            SeqOutcome::Dropped => {
                // last_ms stays put so repeated stale frames cannot defer the resync
                status.stats.seq_drop.increment(now);
                warn!(
                    address = format_args!("{:#06x}", self.options.address),
                    seq = frame.seq,
                    prev,
                    "drop out-of-order frame"
                );
                return outcome;
            }
            SeqOutcome::Skipped => status.stats.seq_skip.increment(now),
            SeqOutcome::Resynced => {
                status.stats.seq_resync.increment(now);
                info!(
                    address = format_args!("{:#06x}", self.options.address),
                    seq = frame.seq,
                    prev,
                    elapsed,
                    "resync sequence after timeout"
                );
            }
            SeqOutcome::Unsequenced | SeqOutcome::InOrder => {}
        }

        status.state.seq = match (frame.seq, prev) {
            (0, 0) => 0,
            (0, prev) => next_seq(prev),
            (seq, _) => seq,
        };
        status.state.last_ms = now;
        if sync_mode {
            status.stats.dmx_sync.increment(now);
        }

        let mut frame = frame.clone();
        frame.sync_mode = sync_mode;
        if self.queue.post(frame) {
            status.stats.queue_overwrite.increment(now);
        }
        drop(status);

        if let Some(group) = &self.options.event_group {
            group.set(index_bit(self.options.index as usize));
        }
        outcome
    }

    pub(super) fn reset_stats(&self) {
        self.status.lock().stats = OutputStats::default();
    }
}

impl Node {
    /// Register an output port.
    ///
    /// Ports outside the node's net + sub-net, or on a physical port above 3,
    /// still receive data but are left out of poll replies.
    pub fn add_output_port(
        &mut self,
        options: OutputPortOptions,
    ) -> Result<OutputHandle, NodeError> {
        let capacity = self.options.read().outputs;
        if self.outputs.len() >= capacity {
            warn!(capacity, "too many outputs");
            return Err(NodeError::OutputsFull { capacity });
        }
        if options.index as usize >= INDEX_MAX {
            return Err(NodeError::InvalidIndex {
                index: options.index,
                max: INDEX_MAX - 1,
            });
        }

        let base = self.address();
        let mut discoverable = true;
        if options.port >= PORT_BANK_SIZE {
            warn!(
                port = options.port,
                "output port not discoverable: port > {}",
                PORT_BANK_SIZE - 1
            );
            discoverable = false;
        }
        if !same_net_subnet(options.address, base) {
            warn!(
                address = format_args!("{:#06x}", options.address),
                base = format_args!("{:#06x}", base),
                "output port not discoverable: net/sub-net mismatch"
            );
            discoverable = false;
        }

        let handle = OutputHandle(self.outputs.len());
        info!(
            output = handle.0,
            port = options.port,
            index = options.index,
            address = format_args!("{:#06x}", options.address),
            "add output"
        );
        self.outputs.push(OutputPort::new(options, discoverable));
        Ok(handle)
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_options(&self, index: usize) -> Option<OutputPortOptions> {
        self.outputs.get(index).map(|output| output.options.clone())
    }

    pub fn output_state(&self, index: usize) -> Option<OutputState> {
        self.outputs.get(index).map(|output| output.status.lock().state)
    }

    pub fn output_stats(&self, index: usize) -> Option<OutputStats> {
        self.outputs.get(index).map(|output| output.status.lock().stats)
    }

    /// Blocking read handle for the consumer of an output port.
    pub fn output_queue(&self, index: usize) -> Option<OutputQueue> {
        self.outputs.get(index).map(|output| OutputQueue {
            mailbox: Arc::clone(&output.queue),
        })
    }

    /// True while within [`SYNC_MODE_TIMEOUT_MS`] of the last ArtSync.
    pub fn sync_mode(&self) -> bool {
        let now = self.now_ms();
        self.sync_ms
            .lock()
            .is_some_and(|sync_ms| now.saturating_sub(sync_ms) < SYNC_MODE_TIMEOUT_MS)
    }

    /// Offer `frame` to every output port patched to `address`.
    ///
    /// Returns the number of ports that accepted the frame. A frame for an
    /// address with no ports is counted as discarded.
    pub fn route_dmx(&self, address: u16, frame: &DmxFrame) -> usize {
        let now = self.now_ms();
        let sync_mode = self.sync_mode();
        let mut matched = 0;
        let mut accepted = 0;

        for output in self.outputs.iter().filter(|o| o.options.address == address) {
            matched += 1;
            if output.accept(frame, now, sync_mode).is_accepted() {
                accepted += 1;
            }
        }

        if matched == 0 {
            trace!(address = format_args!("{:#06x}", address), "no output for address");
            self.count(|stats| &mut stats.dmx_discard);
        }
        accepted
    }

    /// Record an ArtSync and wake consumers.
    ///
    /// Every port counts the sync; each event group is signalled once per
    /// physical port bank.
    pub(super) fn handle_sync(&self) {
        let now = self.now_ms();
        *self.sync_ms.lock() = Some(now);

        for output in &self.outputs {
            output.status.lock().stats.sync_recv.increment(now);
        }
        let groups = self.sync_groups();
        for group in &groups {
            group.set(SYNC_BIT);
        }
        debug!(outputs = self.outputs.len(), groups = groups.len(), "sync");
    }

    /// Event groups to signal for one ArtSync: a group is signalled once per
    /// run of outputs on the same bank. Ports above 3 share one extra bank.
    fn sync_groups(&self) -> Vec<&Arc<EventGroup>> {
        const BANKS: usize = PORT_BANK_SIZE as usize + 1;
        let mut signaled: [Option<&Arc<EventGroup>>; BANKS] = [None; BANKS];
        let mut groups = Vec::new();

        for output in &self.outputs {
            let Some(group) = &output.options.event_group else {
                continue;
            };
            let slot = &mut signaled[usize::from(output.options.port).min(BANKS - 1)];
            if matches!(*slot, Some(prev) if Arc::ptr_eq(prev, group)) {
                continue;
            }
            *slot = Some(group);
            groups.push(group);
        }
        groups
    }

    /// Put every output consumer into test mode until real data arrives.
    pub fn test_outputs(&self) {
        self.signal_event_groups(TEST_BIT);
    }

    /// Signal a sync on every output consumer, also leaving test mode.
    pub fn sync_outputs(&self) {
        self.signal_event_groups(SYNC_BIT);
    }

    fn signal_event_groups(&self, bits: u32) {
        let mut seen: Vec<&Arc<EventGroup>> = Vec::new();
        for group in self.outputs.iter().filter_map(|o| o.options.event_group.as_ref()) {
            if seen.iter().any(|prev| Arc::ptr_eq(prev, group)) {
                continue;
            }
            seen.push(group);
            group.set(bits);
        }
    }
}
