//! Latched notification bits.
//!
//! Bits set by producers stay set until a waiter consumes them, so a single
//! wake-up can report several events. The low 16 bits are port index bits;
//! the flag bits above carry node-wide events.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One bit per port index.
pub const INDEX_BITS: u32 = 0x0000_ffff;
/// Node-wide flag bits.
pub const FLAG_BITS: u32 = 0x00ff_0000;
/// An ArtSync was received.
pub const SYNC_BIT: u32 = 0x0001_0000;
/// Outputs should enter test mode until real data arrives.
pub const TEST_BIT: u32 = 0x0002_0000;

/// Number of port indexes addressable by `INDEX_BITS`.
pub const INDEX_MAX: usize = 16;

pub fn index_bit(index: usize) -> u32 {
    1u32.checked_shl(index as u32).unwrap_or(0) & INDEX_BITS
}

#[derive(Debug, Default)]
pub struct EventGroup {
    bits: Mutex<u32>,
    changed: Condvar,
}

impl EventGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, bits: u32) {
        *self.bits.lock() |= bits;
        self.changed.notify_all();
    }

    pub fn peek(&self) -> u32 {
        *self.bits.lock()
    }

    pub fn clear(&self, mask: u32) -> u32 {
        let mut bits = self.bits.lock();
        let cleared = *bits & mask;
        *bits &= !mask;
        cleared
    }

    /// Wait until any bit in `mask` is set, then consume and return the set
    /// bits within `mask`. Returns 0 on timeout. `None` waits indefinitely.
    pub fn wait(&self, mask: u32, timeout: Option<Duration>) -> u32 {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut bits = self.bits.lock();
        while *bits & mask == 0 {
            match deadline {
                None => self.changed.wait(&mut bits),
                Some(deadline) => {
                    if self.changed.wait_until(&mut bits, deadline).timed_out() {
                        break;
                    }
                }
            }
        }
        let matched = *bits & mask;
        *bits &= !mask;
        matched
    }
}
