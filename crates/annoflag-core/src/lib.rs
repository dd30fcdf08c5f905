//! # annoflag-core
//!
//! Core types, error taxonomy, and shared constants for the annoflag
//! NIPSA propagation worker.
//!
//! This crate provides the foundational data structures that the index and
//! worker crates depend on. It performs no I/O.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    BulkItemFailure, BulkResult, DocumentRef, FlagIntent, PropagationOutcome, QueueMessage,
    UpdateAction, UpdateOp,
};
