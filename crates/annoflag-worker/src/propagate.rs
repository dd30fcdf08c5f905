//! Propagation orchestrator.
//!
//! One run drives query → scan → translate → bulk write for a single
//! (user, intent) pair. A run is an atomic attempt, not an atomic outcome:
//! there is no internal retry, and partial item failures are reported in the
//! outcome rather than raised. Retry arrives, if at all, as a redelivered
//! queue message.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use annoflag_core::{FlagIntent, PropagationOutcome, Result};
use annoflag_index::{actions, BulkMutator, FlagQuery, Scanner, SearchIndex};

/// Propagates a flag intent across every annotation a user owns.
pub struct Propagator {
    scanner: Scanner,
    mutator: BulkMutator,
}

impl Propagator {
    /// Create a propagator over the given index handle.
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            scanner: Scanner::new(index.clone()),
            mutator: BulkMutator::new(index),
        }
    }

    /// Override the scan window size.
    pub fn with_page_size(self, page_size: usize) -> Self {
        Self {
            scanner: self.scanner.with_page_size(page_size),
            mutator: self.mutator,
        }
    }

    /// Run one propagation: flag (or unflag) all of `user_id`'s annotations.
    ///
    /// The full match set is identified before any write begins — the writes
    /// change what the predicate matches, so they must never feed back into
    /// the scan that produced them. Successive runs of the same intent are
    /// idempotent: the second run matches zero documents.
    #[instrument(skip(self), fields(intent = %intent))]
    pub async fn run(&self, user_id: &str, intent: FlagIntent) -> Result<PropagationOutcome> {
        let start = Instant::now();
        let query = FlagQuery::for_intent(user_id, intent)?;

        let matches = self.scanner.scan(&query).await?;
        let batch = actions::translate(&matches, intent)?;
        let result = self.mutator.apply(&batch).await?;

        let outcome = PropagationOutcome {
            user_id: user_id.to_string(),
            intent,
            matched: matches.len(),
            succeeded: result.succeeded,
            failed: result.failed(),
            failures: result.failures,
        };

        if outcome.is_clean() {
            info!(
                matched = outcome.matched,
                succeeded = outcome.succeeded,
                duration_ms = start.elapsed().as_millis() as u64,
                "Propagation complete"
            );
        } else {
            warn!(
                matched = outcome.matched,
                succeeded = outcome.succeeded,
                failed = outcome.failed,
                duration_ms = start.elapsed().as_millis() as u64,
                "Propagation complete with item failures"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annoflag_core::Error;
    use annoflag_index::MemoryIndex;

    #[tokio::test]
    async fn test_empty_user_id_rejected_before_any_io() {
        let index = Arc::new(MemoryIndex::new());
        let propagator = Propagator::new(index.clone());
        let err = propagator.run("", FlagIntent::Suppress).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(index.search_calls(), 0);
        assert_eq!(index.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn test_scan_failure_propagates_without_writes() {
        let index = Arc::new(MemoryIndex::new());
        index.insert_annotation("acct:alice");
        index.fail_next_search("node down");

        let propagator = Propagator::new(index.clone());
        let err = propagator
            .run("acct:alice", FlagIntent::Suppress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Scan(_)));
        assert_eq!(index.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_reported_not_raised() {
        let index = Arc::new(MemoryIndex::new());
        index.insert_annotation("acct:alice");
        let bad = index.insert_annotation("acct:alice");
        index.fail_document(&bad, "mapping conflict");

        let propagator = Propagator::new(index);
        let outcome = propagator
            .run("acct:alice", FlagIntent::Suppress)
            .await
            .unwrap();
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.failures[0].document_id, bad);
    }
}
