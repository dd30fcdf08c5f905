//! The queue/broker seam.
//!
//! [`QueueConsumer`] is the explicit receive interface the listener loop
//! drives. Settling a delivery takes a [`Disposition`], so whether a failed
//! message comes back is the broker's call, not the worker's: `Ack` means
//! done with it forever, `Requeue` hands it back for redelivery under the
//! broker's own policy.
//!
//! Two implementations ship here: [`ChannelConsumer`], an in-process
//! `tokio::sync::mpsc` queue with a working requeue path (used by tests and
//! single-process deployments), and [`PipeConsumer`], which reads
//! newline-delimited payloads from a byte stream so the worker can sit
//! behind a broker tail CLI (e.g. `nsq_tail ... | annoflag-worker`).

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::warn;

use annoflag_core::{Error, Result};

/// One raw delivery from the queue.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Opaque encoded payload.
    pub body: String,
    /// Delivery attempt, starting at 1. Requeues increment it.
    pub attempt: u32,
}

impl Delivery {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            attempt: 1,
        }
    }
}

/// How the listener settles a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Done with this message, success or permanently undeliverable.
    Ack,
    /// Hand the message back for redelivery.
    Requeue,
}

/// Receive side of the queue boundary.
#[async_trait]
pub trait QueueConsumer: Send {
    /// Wait for the next delivery. `None` means the queue is closed and no
    /// more messages will arrive.
    async fn recv(&mut self) -> Option<Delivery>;

    /// Settle a delivery. Must be called exactly once per received message,
    /// after processing finishes (success or failure).
    async fn finish(&mut self, delivery: Delivery, disposition: Disposition) -> Result<()>;
}

/// Publish side of the in-process queue.
#[derive(Clone)]
pub struct QueuePublisher {
    tx: mpsc::Sender<Delivery>,
}

impl QueuePublisher {
    /// Publish a raw payload.
    pub async fn publish(&self, body: impl Into<String>) -> Result<()> {
        self.tx
            .send(Delivery::new(body))
            .await
            .map_err(|_| Error::Queue("queue is closed".into()))
    }
}

/// In-process [`QueueConsumer`] backed by a bounded mpsc channel.
///
/// Requeued deliveries go into a consumer-local redelivery buffer, not back
/// into the shared channel: the consumer is the channel's only receiver, so
/// sending into a full channel from `finish` would block on itself.
/// Redeliveries are drained before new messages.
pub struct ChannelConsumer {
    rx: mpsc::Receiver<Delivery>,
    redeliveries: VecDeque<Delivery>,
}

/// Create a connected publisher/consumer pair with the given capacity.
pub fn channel(capacity: usize) -> (QueuePublisher, ChannelConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let consumer = ChannelConsumer {
        rx,
        redeliveries: VecDeque::new(),
    };
    (QueuePublisher { tx }, consumer)
}

#[async_trait]
impl QueueConsumer for ChannelConsumer {
    async fn recv(&mut self) -> Option<Delivery> {
        if let Some(redelivery) = self.redeliveries.pop_front() {
            return Some(redelivery);
        }
        self.rx.recv().await
    }

    async fn finish(&mut self, delivery: Delivery, disposition: Disposition) -> Result<()> {
        match disposition {
            Disposition::Ack => Ok(()),
            Disposition::Requeue => {
                self.redeliveries.push_back(Delivery {
                    body: delivery.body,
                    attempt: delivery.attempt + 1,
                });
                Ok(())
            }
        }
    }
}

/// [`QueueConsumer`] reading newline-delimited payloads from a byte stream.
///
/// A pipe cannot redeliver, so `Requeue` is settled with a warning and the
/// message is lost; deployments that need real redelivery use a broker-backed
/// consumer instead.
pub struct PipeConsumer<R> {
    lines: Lines<BufReader<R>>,
}

impl PipeConsumer<tokio::io::Stdin> {
    /// Consume from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send> PipeConsumer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> QueueConsumer for PipeConsumer<R> {
    async fn recv(&mut self) -> Option<Delivery> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(Delivery::new(line)),
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Failed to read from pipe, treating as closed");
                    return None;
                }
            }
        }
    }

    async fn finish(&mut self, _delivery: Delivery, disposition: Disposition) -> Result<()> {
        if disposition == Disposition::Requeue {
            warn!("Pipe source cannot redeliver, dropping message");
        }
        Ok(())
    }
}
