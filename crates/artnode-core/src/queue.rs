//! Single-slot overwrite queue.
//!
//! A producer never blocks: posting into a full slot replaces the unconsumed
//! value and reports the overwrite so callers can count it. Consumers block
//! with an optional timeout.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store `value`, returning `true` if an unconsumed value was overwritten.
    pub fn post(&self, value: T) -> bool {
        let overwritten = self.slot.lock().replace(value).is_some();
        self.ready.notify_one();
        overwritten
    }

    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Wait for a value. `None` blocks indefinitely.
    pub fn take_timeout(&self, timeout: Option<Duration>) -> Option<T> {
        let mut slot = self.slot.lock();
        match timeout {
            None => {
                while slot.is_none() {
                    self.ready.wait(&mut slot);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while slot.is_none() {
                    if self.ready.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
            }
        }
        slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
