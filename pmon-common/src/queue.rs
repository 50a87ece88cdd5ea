//! Single-consumer work queue
//!
//! HTTP handlers are producers; exactly one consumer task drains the queue,
//! so every store mutation behind it is linearized without locks. The queue
//! is unbounded: a push never waits on the consumer.

use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message delivered to the consumer
#[derive(Debug, Clone, PartialEq)]
pub enum QueueMessage<T> {
    /// Control sentinel from `GET /start`; consumers ignore it
    Start,
    /// Validated payload
    Item(T),
}

/// Producer handle, cloned into every request handler
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::UnboundedSender<QueueMessage<T>>,
    depth: Arc<AtomicUsize>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            depth: Arc::clone(&self.depth),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue a payload
    pub fn push(&self, item: T) -> Result<()> {
        self.send(QueueMessage::Item(item))
    }

    /// Enqueue the start sentinel
    pub fn push_start(&self) -> Result<()> {
        self.send(QueueMessage::Start)
    }

    /// Messages enqueued but not yet taken by the consumer
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    fn send(&self, message: QueueMessage<T>) -> Result<()> {
        self.depth.fetch_add(1, Ordering::Relaxed);
        self.tx.send(message).map_err(|_| {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            Error::Internal("queue consumer has stopped".to_string())
        })
    }
}

/// Consumer handle; owned by exactly one task
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::UnboundedReceiver<QueueMessage<T>>,
    depth: Arc<AtomicUsize>,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next message in FIFO order.
    ///
    /// Returns `None` once every sender has been dropped and the queue is drained.
    pub async fn next(&mut self) -> Option<QueueMessage<T>> {
        let message = self.rx.recv().await;
        if message.is_some() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
        }
        message
    }
}

/// Create a connected sender/receiver pair
pub fn work_queue<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        QueueSender {
            tx,
            depth: Arc::clone(&depth),
        },
        QueueReceiver { rx, depth },
    )
}
