//! Connection admission semaphore
//!
//! A fixed pool of tickets over a bounded channel: acquire receives a
//! ticket and blocks when the pool is empty; the permit sends it back on
//! drop, so a panicking connection worker still releases its slot.

use crossbeam::channel::{bounded, Receiver, Sender};

/// Fixed-capacity ticket pool
pub struct Semaphore {
    tickets_tx: Sender<()>,
    tickets_rx: Receiver<()>,
}

impl Semaphore {
    pub fn new(tickets: usize) -> Self {
        let (tickets_tx, tickets_rx) = bounded(tickets);
        for _ in 0..tickets {
            let _ = tickets_tx.send(());
        }
        Self {
            tickets_tx,
            tickets_rx,
        }
    }

    /// Take one ticket, blocking until one is available
    pub fn acquire(&self) -> SemaphorePermit {
        // Cannot disconnect: we hold a sender for the permit round-trip
        let _ = self.tickets_rx.recv();
        SemaphorePermit {
            tickets_tx: self.tickets_tx.clone(),
        }
    }
}

/// One admission ticket; returned to the pool on drop
pub struct SemaphorePermit {
    tickets_tx: Sender<()>,
}

impl Drop for SemaphorePermit {
    fn drop(&mut self) {
        let _ = self.tickets_tx.send(());
    }
}
