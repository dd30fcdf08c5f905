//! Bulk submission of update actions.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use annoflag_core::{BulkResult, Result, UpdateAction};

use crate::client::SearchIndex;

/// Submits a batch of update actions to the index as one bulk operation and
/// surfaces per-item outcomes.
///
/// An empty batch is a no-op: it returns an empty successful result without
/// touching the transport.
pub struct BulkMutator {
    index: Arc<dyn SearchIndex>,
}

impl BulkMutator {
    /// Create a mutator over the given index handle.
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Apply all actions in one batch.
    ///
    /// Item failures are reported in the [`BulkResult`], never raised; only
    /// transport-level failure to submit the batch at all is an error.
    pub async fn apply(&self, actions: &[UpdateAction]) -> Result<BulkResult> {
        if actions.is_empty() {
            debug!("Empty action batch, skipping bulk submit");
            return Ok(BulkResult::default());
        }

        let start = Instant::now();
        let result = self.index.bulk(actions).await?;

        if result.is_clean() {
            info!(
                succeeded = result.succeeded,
                duration_ms = start.elapsed().as_millis() as u64,
                "Bulk update applied"
            );
        } else {
            warn!(
                succeeded = result.succeeded,
                failed = result.failed(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Bulk update applied with item failures"
            );
            for failure in &result.failures {
                warn!(
                    document_id = %failure.document_id,
                    reason = %failure.reason,
                    "Bulk item failed"
                );
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use crate::memory::MemoryIndex;
    use annoflag_core::{DocumentRef, FlagIntent};

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let index = Arc::new(MemoryIndex::new());
        let mutator = BulkMutator::new(index.clone());
        let result = mutator.apply(&[]).await.unwrap();
        assert_eq!(result, BulkResult::default());
        assert_eq!(index.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_roll_back() {
        let index = Arc::new(MemoryIndex::new());
        let a1 = index.insert_annotation("acct:alice");
        let a2 = index.insert_annotation("acct:alice");
        let a3 = index.insert_annotation("acct:alice");
        index.fail_document(&a2, "version conflict");

        let docs: Vec<DocumentRef> = [&a1, &a2, &a3]
            .iter()
            .map(|id| DocumentRef::new(id.as_str(), "annotation"))
            .collect();
        let batch = actions::translate(&docs, FlagIntent::Suppress).unwrap();

        let mutator = BulkMutator::new(index.clone());
        let result = mutator.apply(&batch).await.unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.failures[0].document_id, a2);
        // The two applied updates stay applied.
        assert!(index.is_suppressed(&a1));
        assert!(!index.is_suppressed(&a2));
        assert!(index.is_suppressed(&a3));
    }

    #[tokio::test]
    async fn test_clear_on_unflagged_document_is_a_successful_no_op() {
        let index = Arc::new(MemoryIndex::new());
        let a1 = index.insert_annotation("acct:alice");

        let docs = vec![DocumentRef::new(a1.as_str(), "annotation")];
        let batch = actions::translate(&docs, FlagIntent::Unsuppress).unwrap();

        let mutator = BulkMutator::new(index.clone());
        let result = mutator.apply(&batch).await.unwrap();
        assert_eq!(result.succeeded, 1);
        assert!(result.is_clean());
    }

    #[tokio::test]
    async fn test_transport_failure_raises() {
        let index = Arc::new(MemoryIndex::new());
        let a1 = index.insert_annotation("acct:alice");
        index.fail_next_bulk("connection refused");

        let docs = vec![DocumentRef::new(a1.as_str(), "annotation")];
        let batch = actions::translate(&docs, FlagIntent::Suppress).unwrap();

        let mutator = BulkMutator::new(index);
        let err = mutator.apply(&batch).await.unwrap_err();
        assert!(matches!(err, annoflag_core::Error::BulkSubmit(_)));
    }
}
