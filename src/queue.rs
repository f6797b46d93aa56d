//! Bounded hand-off queue between releasing and acquiring tasks

use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Lock-free storage plus a semaphore counting the stored items.
///
/// Waiters are served in FIFO order by the semaphore. Every stored item is
/// backed by exactly one permit, so a waiter holding a permit always finds
/// an item.
pub(crate) struct HandoffQueue<T> {
    items: ArrayQueue<T>,
    ready: Semaphore,
    gate: Mutex<bool>,
}

impl<T> HandoffQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: ArrayQueue::new(capacity.max(1)),
            ready: Semaphore::new(0),
            gate: Mutex::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hands the item back when the queue is closed or full.
    pub fn push(&self, item: T) -> Result<(), T> {
        let closed = self.gate.lock();
        if *closed {
            return Err(item);
        }
        self.items.push(item)?;
        self.ready.add_permits(1);
        Ok(())
    }

    pub fn try_pop(&self) -> Option<T> {
        let permit = self.ready.try_acquire().ok()?;
        permit.forget();
        self.items.pop()
    }

    /// Wait up to `timeout` for an item. `None` on timeout or when closed.
    pub async fn pop(&self, timeout: Duration) -> Option<T> {
        if timeout.is_zero() {
            return self.try_pop();
        }
        let permit = tokio::time::timeout(timeout, self.ready.acquire())
            .await
            .ok()?
            .ok()?;
        permit.forget();
        self.items.pop()
    }

    /// Close the queue, wake every waiter and hand back what was stored.
    pub fn close(&self) -> Vec<T> {
        let mut closed = self.gate.lock();
        *closed = true;
        self.ready.close();
        let mut drained = Vec::with_capacity(self.items.len());
        while let Some(item) = self.items.pop() {
            drained.push(item);
        }
        drained
    }
}
