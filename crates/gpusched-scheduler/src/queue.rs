//! Bounded FIFO of pods awaiting a placement decision.
//!
//! Many producers (the cluster watcher and its resync task) feed a single
//! consumer (the decision loop). `enqueue` waits for room when the buffer is
//! full and `try_enqueue` rejects instead. Closing the consumer side is the
//! shutdown signal: producers start failing with `QueueClosed` while pods
//! already buffered can still be drained.

use crate::error::{Result, SchedulerError};
use gpusched_core::Pod;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Constructor for the producer/consumer pair
pub struct WorkloadQueue;

impl WorkloadQueue {
    /// Create a queue holding at most `capacity` pods
    pub fn bounded(capacity: usize) -> Result<(QueueProducer, QueueConsumer)> {
        if capacity == 0 {
            return Err(SchedulerError::invalid_config(
                "queue capacity must be greater than zero",
                "Set queueCapacity to a positive number (default 300)",
            ));
        }

        let (tx, rx) = mpsc::channel(capacity);
        Ok((QueueProducer { tx, capacity }, QueueConsumer { rx }))
    }
}

/// Cloneable sending half
#[derive(Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<Pod>,
    capacity: usize,
}

impl QueueProducer {
    /// Add a pod, waiting while the queue is full
    pub async fn enqueue(&self, pod: Pod) -> Result<()> {
        self.tx
            .send(pod)
            .await
            .map_err(|_| SchedulerError::QueueClosed)
    }

    /// Add a pod without waiting
    pub fn try_enqueue(&self, pod: Pod) -> Result<()> {
        self.tx.try_send(pod).map_err(|e| match e {
            TrySendError::Full(_) => SchedulerError::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => SchedulerError::QueueClosed,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the decision loop
pub struct QueueConsumer {
    rx: mpsc::Receiver<Pod>,
}

impl QueueConsumer {
    /// Wait for the next pod.
    ///
    /// Returns `None` once the queue is closed (or every producer is gone)
    /// and the buffer is empty.
    pub async fn dequeue(&mut self) -> Option<Pod> {
        self.rx.recv().await
    }

    /// Stop accepting new pods; buffered pods remain available
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
