//! # annoflag-worker
//!
//! The NIPSA propagation worker.
//!
//! This crate provides:
//! - [`Propagator`]: one-shot propagation of a flag/unflag intent across
//!   every annotation a user owns
//! - [`QueueConsumer`]: the broker seam, with explicit ack/requeue
//!   dispositions so redelivery policy stays with the broker
//! - [`Listener`]: the long-running consumption loop with graceful shutdown
//!   and broadcast lifecycle events
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use annoflag_index::HttpSearchIndex;
//! use annoflag_worker::{queue, Listener, ListenerConfig, ListenerEvent};
//!
//! let index = Arc::new(HttpSearchIndex::new("http://localhost:9200", "annotator")?);
//! let (publisher, consumer) = queue::channel(64);
//! let listener = Listener::new(index, consumer, ListenerConfig::from_env()?);
//!
//! let handle = listener.start();
//! publisher.publish(r#"{"user_id": "acct:alice", "action": "nipsa"}"#).await?;
//!
//! // Graceful shutdown drains the in-flight message first.
//! handle.shutdown().await?;
//! ```

pub mod config;
pub mod listener;
pub mod propagate;
pub mod queue;

// Re-export core types
pub use annoflag_core::*;

pub use config::ListenerConfig;
pub use listener::{wait_until_stopped, Listener, ListenerEvent, ListenerHandle};
pub use propagate::Propagator;
pub use queue::{ChannelConsumer, Delivery, Disposition, PipeConsumer, QueueConsumer, QueuePublisher};
