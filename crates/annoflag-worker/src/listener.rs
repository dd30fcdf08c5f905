//! The long-running consumption loop.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use annoflag_core::defaults::EVENT_BUS_CAPACITY;
use annoflag_core::{Error, FlagIntent, QueueMessage, Result};
use annoflag_index::SearchIndex;

use crate::config::ListenerConfig;
use crate::propagate::Propagator;
use crate::queue::{Delivery, Disposition, QueueConsumer};

/// Event emitted by the listener.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    /// Listener started consuming.
    Started,
    /// A message was decoded and its propagation run finished.
    MessageHandled {
        user_id: String,
        intent: FlagIntent,
        matched: usize,
        succeeded: usize,
        failed: usize,
    },
    /// A message payload could not be decoded; it was dropped.
    DecodeFailed { error: String },
    /// A propagation run failed hard; the message was requeued.
    RunFailed {
        user_id: String,
        intent: FlagIntent,
        error: String,
    },
    /// Listener stopped.
    Stopped,
}

/// Handle for controlling a running listener.
pub struct ListenerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<ListenerEvent>,
    join: JoinHandle<()>,
}

impl ListenerHandle {
    /// Signal the listener to shut down and wait for it to drain.
    ///
    /// The in-flight message, if any, is processed to completion first: a
    /// bulk write is not safely interruptible without risking partial state.
    pub async fn shutdown(self) -> Result<()> {
        // Send can fail only if the loop already exited; joining still applies.
        let _ = self.shutdown_tx.send(()).await;
        self.join
            .await
            .map_err(|e| Error::Internal(format!("listener task panicked: {e}")))
    }

    /// Get a receiver for listener events.
    pub fn events(&self) -> broadcast::Receiver<ListenerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Wait until the listener broadcasts [`ListenerEvent::Stopped`].
///
/// A receiver that falls behind the event bus lags rather than closes;
/// lagging skips ahead and keeps waiting. Only a closed channel (listener
/// task gone without a `Stopped`) ends the wait early.
pub async fn wait_until_stopped(events: &mut broadcast::Receiver<ListenerEvent>) {
    loop {
        match events.recv().await {
            Ok(ListenerEvent::Stopped) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event receiver lagged, continuing to wait");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// The queue listener: decodes each delivery into (user, intent), runs the
/// propagator, settles the message, and keeps consuming until shut down or
/// the queue closes.
pub struct Listener<C> {
    propagator: Propagator,
    consumer: C,
    config: ListenerConfig,
    event_tx: broadcast::Sender<ListenerEvent>,
}

impl<C: QueueConsumer + 'static> Listener<C> {
    /// Create a listener over the given index handle and consumer.
    pub fn new(index: Arc<dyn SearchIndex>, consumer: C, config: ListenerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let propagator = Propagator::new(index).with_page_size(config.scan_page_size);
        Self {
            propagator,
            consumer,
            config,
            event_tx,
        }
    }

    /// Get a receiver for listener events.
    pub fn events(&self) -> broadcast::Receiver<ListenerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the listener and return a handle for control.
    pub fn start(self) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });

        ListenerHandle {
            shutdown_tx,
            event_rx,
            join,
        }
    }

    async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            queue = %self.config.queue,
            channel = %self.config.channel,
            "Listener started"
        );
        let _ = self.event_tx.send(ListenerEvent::Started);

        loop {
            // The shutdown branch is only reachable between messages, so an
            // in-flight run always drains before the loop stops.
            let delivery = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Listener received shutdown signal");
                    break;
                }
                delivery = self.consumer.recv() => match delivery {
                    Some(delivery) => delivery,
                    None => {
                        info!("Queue closed, listener stopping");
                        break;
                    }
                },
            };
            self.handle_delivery(delivery).await;
        }

        let _ = self.event_tx.send(ListenerEvent::Stopped);
        info!("Listener stopped");
    }

    async fn handle_delivery(&mut self, delivery: Delivery) {
        let disposition = match QueueMessage::decode(&delivery.body) {
            Err(e) => {
                // Malformed payloads are permanently undeliverable.
                warn!(error = %e, attempt = delivery.attempt, "Dropping undecodable message");
                let _ = self.event_tx.send(ListenerEvent::DecodeFailed {
                    error: e.to_string(),
                });
                Disposition::Ack
            }
            Ok(message) => {
                match self.propagator.run(&message.user_id, message.action).await {
                    Ok(outcome) => {
                        let _ = self.event_tx.send(ListenerEvent::MessageHandled {
                            user_id: outcome.user_id,
                            intent: outcome.intent,
                            matched: outcome.matched,
                            succeeded: outcome.succeeded,
                            failed: outcome.failed,
                        });
                        Disposition::Ack
                    }
                    Err(e) => {
                        error!(
                            user_id = %message.user_id,
                            intent = %message.action,
                            attempt = delivery.attempt,
                            error = %e,
                            "Propagation failed, requeueing message"
                        );
                        let _ = self.event_tx.send(ListenerEvent::RunFailed {
                            user_id: message.user_id,
                            intent: message.action,
                            error: e.to_string(),
                        });
                        Disposition::Requeue
                    }
                }
            }
        };

        if let Err(e) = self.consumer.finish(delivery, disposition).await {
            error!(error = %e, "Failed to settle message");
        }
    }
}
