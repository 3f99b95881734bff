//! Counting semaphore bounding the connections handled at once.
//!
//! The gate is a bounded channel used as a token bucket: acquiring sends a
//! token (waiting while the channel is full), and dropping the permit takes
//! one back out. Because release happens in `Drop`, a slot is returned on
//! every exit path of the handling task, including panics.

use async_std::channel::{self, Receiver, Sender};

#[derive(Debug, Clone)]
pub struct ConnectionGate {
    slots: Sender<()>,
    held: Receiver<()>,
    capacity: usize,
}

impl ConnectionGate {
    /// Creates a gate admitting at most `capacity` holders; a zero
    /// capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (slots, held) = channel::bounded(capacity);
        Self {
            slots,
            held,
            capacity,
        }
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> ConnectionPermit {
        // The gate owns a receiver, so the channel is never closed
        let _ = self.slots.send(()).await;
        ConnectionPermit {
            held: self.held.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.capacity - self.in_use()
    }
}

/// A held slot; dropping it releases the slot.
#[derive(Debug)]
pub struct ConnectionPermit {
    held: Receiver<()>,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        // The token sent by `acquire` is still queued, so this never fails
        let _ = self.held.try_recv();
    }
}
