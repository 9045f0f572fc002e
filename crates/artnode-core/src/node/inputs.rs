use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::{InputPortOptions, InputState};
use super::error::NodeError;
use super::Node;
use crate::address::same_net_subnet;
use crate::dmx::DmxFrame;
use crate::notify::{INDEX_BITS, index_bit};
use crate::queue::Mailbox;
use crate::stats::InputStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputHandle(pub(super) usize);

impl InputHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
struct InputStatus {
    state: InputState,
    stats: InputStats,
}

#[derive(Debug)]
pub(super) struct InputPort {
    pub(super) options: InputPortOptions,
    queue: Mailbox<DmxFrame>,
    status: Mutex<InputStatus>,
}

impl InputPort {
    pub(super) fn has_data(&self) -> bool {
        self.status.lock().state.last_ms.is_some()
    }

    pub(super) fn reset_stats(&self) {
        self.status.lock().stats = InputStats::default();
    }
}

impl Node {
    /// Register an input port. Its address must share the node's net + sub-net.
    pub fn add_input_port(&mut self, options: InputPortOptions) -> Result<InputHandle, NodeError> {
        let capacity = self.options.read().inputs;
        if self.inputs.len() >= capacity {
            warn!(capacity, "exceeded number of supported inputs");
            return Err(NodeError::InputsFull { capacity });
        }

        let base = self.address();
        if !same_net_subnet(options.address, base) {
            warn!(
                port = options.port,
                index = options.index,
                address = format_args!("{:#06x}", options.address),
                base = format_args!("{:#06x}", base),
                "input address mismatch"
            );
            return Err(NodeError::AddressMismatch {
                address: options.address,
                base,
            });
        }

        let handle = InputHandle(self.inputs.len());
        info!(
            input = handle.0,
            port = options.port,
            index = options.index,
            address = format_args!("{:#06x}", options.address),
            "add input"
        );
        self.inputs.push(InputPort {
            options,
            queue: Mailbox::new(),
            status: Mutex::new(InputStatus::default()),
        });
        Ok(handle)
    }

    pub fn inputs_enabled(&self) -> bool {
        self.options.read().inputs > 0
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn input_options(&self, index: usize) -> Option<InputPortOptions> {
        self.inputs.get(index).map(|input| input.options)
    }

    pub fn input_state(&self, index: usize) -> Option<InputState> {
        self.inputs.get(index).map(|input| input.status.lock().state)
    }

    pub fn input_stats(&self, index: usize) -> Option<InputStats> {
        self.inputs.get(index).map(|input| input.status.lock().stats)
    }

    /// Queue a locally read frame for the aggregation loop.
    ///
    /// Never blocks; an unconsumed frame is replaced and counted.
    pub fn submit_input(&self, input: InputHandle, frame: &DmxFrame) {
        let Some(port) = self.inputs.get(input.0) else {
            warn!(input = input.0, "submit to unknown input");
            return;
        };
        let now = self.now_ms();

        {
            let mut status = port.status.lock();
            status.state.last_ms = Some(now);
            status.state.len = frame.len() as u16;
            status.stats.dmx_recv.increment(now);

            if port.queue.post(frame.clone()) {
                status.stats.queue_overwrite.increment(now);
            }
        }

        self.input_events.set(index_bit(input.0));
    }

    /// Wait for input notifications and route every signalled input's queued
    /// frame to the outputs. Returns the number of frames routed; 0 on
    /// timeout. `None` waits indefinitely.
    pub fn process_inputs(&self, timeout: Option<Duration>) -> usize {
        let bits = self.input_events.wait(INDEX_BITS, timeout);
        let mut routed = 0;

        for (index, input) in self.inputs.iter().enumerate() {
            if bits & index_bit(index) == 0 {
                continue;
            }
            let Some(frame) = input.queue.try_take() else {
                warn!(input = index, "notified input has no queued frame");
                continue;
            };
            debug!(
                input = index,
                address = format_args!("{:#06x}", input.options.address),
                seq = frame.seq,
                len = frame.len(),
                "route input"
            );
            self.route_dmx(input.options.address, &frame);
            routed += 1;
        }
        routed
    }

    /// Run the input aggregation loop. Never returns.
    pub fn inputs_main(&self) {
        info!(inputs = self.inputs.len(), "inputs main");
        loop {
            self.process_inputs(None);
        }
    }
}
