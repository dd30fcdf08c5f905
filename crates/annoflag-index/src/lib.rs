//! # annoflag-index
//!
//! Search-index boundary for the annoflag worker.
//!
//! This crate provides:
//! - The [`SearchIndex`] trait: an explicit, injected index handle (no
//!   ambient global client)
//! - Typed flag queries selecting a user's suppressed or unsuppressed
//!   annotations
//! - A windowed deep [`Scanner`] that materializes the full match set
//! - The pure action translator and the [`BulkMutator`]
//! - [`HttpSearchIndex`], an Elasticsearch-shaped HTTP implementation, and
//!   [`MemoryIndex`], an in-memory implementation for tests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use annoflag_core::FlagIntent;
//! use annoflag_index::{BulkMutator, FlagQuery, HttpSearchIndex, Scanner, actions};
//!
//! let index = Arc::new(HttpSearchIndex::new("http://localhost:9200", "annotator")?);
//! let scanner = Scanner::new(index.clone());
//! let mutator = BulkMutator::new(index);
//!
//! let query = FlagQuery::for_intent("acct:alice@example.com", FlagIntent::Suppress)?;
//! let matches = scanner.scan(&query).await?;
//! let batch = actions::translate(&matches, FlagIntent::Suppress)?;
//! let result = mutator.apply(&batch).await?;
//! ```

pub mod actions;
pub mod bulk;
pub mod client;
pub mod http;
pub mod memory;
pub mod query;
pub mod scanner;

// Re-export core types
pub use annoflag_core::*;

pub use bulk::BulkMutator;
pub use client::{ScanCursor, ScanPage, SearchIndex};
pub use http::HttpSearchIndex;
pub use memory::MemoryIndex;
pub use query::FlagQuery;
pub use scanner::Scanner;
