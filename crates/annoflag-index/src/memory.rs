//! In-memory search index for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use annoflag_core::defaults::ANNOTATION_TYPE;
use annoflag_core::{BulkItemFailure, BulkResult, DocumentRef, Error, Result, UpdateAction, UpdateOp};

use crate::client::{ScanCursor, ScanPage, SearchIndex};
use crate::query::FlagQuery;

#[derive(Debug, Clone)]
struct MemoryDoc {
    id: String,
    user_id: String,
    suppressed: bool,
}

#[derive(Default)]
struct MemoryState {
    docs: Vec<MemoryDoc>,
    next_id: usize,
    fail_next_search: Option<String>,
    fail_next_bulk: Option<String>,
    failing_docs: HashMap<String, String>,
}

/// In-memory [`SearchIndex`] implementation for testing.
///
/// Documents live in insertion order, which gives `from`/`size` windowing
/// deterministic pages. Transport and per-item failures can be injected to
/// exercise the error paths.
#[derive(Default)]
pub struct MemoryIndex {
    state: Mutex<MemoryState>,
    search_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicked test thread must not wedge every other test.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert an unsuppressed annotation owned by `user_id`; returns its id.
    pub fn insert_annotation(&self, user_id: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("a{}", state.next_id);
        state.docs.push(MemoryDoc {
            id: id.clone(),
            user_id: user_id.to_string(),
            suppressed: false,
        });
        id
    }

    /// Whether the given document currently carries the suppression marker.
    pub fn is_suppressed(&self, id: &str) -> bool {
        self.lock()
            .docs
            .iter()
            .any(|d| d.id == id && d.suppressed)
    }

    /// Make the next `search_page` call fail with a scan error.
    pub fn fail_next_search(&self, reason: &str) {
        self.lock().fail_next_search = Some(reason.to_string());
    }

    /// Make the next `bulk` call fail at the transport level.
    pub fn fail_next_bulk(&self, reason: &str) {
        self.lock().fail_next_bulk = Some(reason.to_string());
    }

    /// Make every bulk action targeting `id` fail individually.
    pub fn fail_document(&self, id: &str, reason: &str) {
        self.lock()
            .failing_docs
            .insert(id.to_string(), reason.to_string());
    }

    /// Number of `search_page` calls seen.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of `bulk` calls seen.
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn search_page(
        &self,
        query: &FlagQuery,
        cursor: Option<ScanCursor>,
        size: usize,
    ) -> Result<ScanPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(reason) = state.fail_next_search.take() {
            return Err(Error::Scan(reason));
        }

        // Cursor is an offset into the match sequence.
        let from = match &cursor {
            Some(c) => c
                .as_str()
                .parse::<usize>()
                .map_err(|_| Error::Scan(format!("bad scan cursor: {}", c.as_str())))?,
            None => 0,
        };

        let hits: Vec<DocumentRef> = state
            .docs
            .iter()
            .filter(|d| query.matches(&d.user_id, d.suppressed))
            .skip(from)
            .take(size)
            .map(|d| DocumentRef::new(d.id.as_str(), ANNOTATION_TYPE))
            .collect();

        let cursor = if hits.len() == size {
            Some(ScanCursor::new((from + size).to_string()))
        } else {
            None
        };
        Ok(ScanPage { hits, cursor })
    }

    async fn bulk(&self, actions: &[UpdateAction]) -> Result<BulkResult> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(reason) = state.fail_next_bulk.take() {
            return Err(Error::BulkSubmit(reason));
        }

        let mut result = BulkResult::default();
        for action in actions {
            if let Some(reason) = state.failing_docs.get(&action.document_id) {
                result.failures.push(BulkItemFailure {
                    document_id: action.document_id.clone(),
                    reason: reason.clone(),
                });
                continue;
            }
            match state
                .docs
                .iter_mut()
                .find(|d| d.id == action.document_id)
            {
                Some(doc) => {
                    doc.suppressed = match action.op {
                        UpdateOp::SetSuppressed => true,
                        UpdateOp::ClearSuppressed => false,
                    };
                    result.succeeded += 1;
                }
                None => result.failures.push(BulkItemFailure {
                    document_id: action.document_id.clone(),
                    reason: "document missing".to_string(),
                }),
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annoflag_core::FlagIntent;

    #[tokio::test]
    async fn test_marker_toggles() {
        let index = MemoryIndex::new();
        let id = index.insert_annotation("acct:alice");
        assert!(!index.is_suppressed(&id));

        let set = UpdateAction {
            document_id: id.clone(),
            doc_type: ANNOTATION_TYPE.to_string(),
            op: UpdateOp::SetSuppressed,
        };
        index.bulk(std::slice::from_ref(&set)).await.unwrap();
        assert!(index.is_suppressed(&id));

        let clear = UpdateAction {
            op: UpdateOp::ClearSuppressed,
            ..set
        };
        index.bulk(&[clear]).await.unwrap();
        assert!(!index.is_suppressed(&id));
    }

    #[tokio::test]
    async fn test_search_page_windows() {
        let index = MemoryIndex::new();
        for _ in 0..5 {
            index.insert_annotation("acct:alice");
        }
        let query = FlagQuery::for_intent("acct:alice", FlagIntent::Suppress).unwrap();

        let first = index.search_page(&query, None, 2).await.unwrap();
        let second = index
            .search_page(&query, first.cursor.clone(), 2)
            .await
            .unwrap();
        let last = index.search_page(&query, second.cursor.clone(), 2).await.unwrap();

        assert_eq!(first.hits.len(), 2);
        assert_eq!(second.hits.len(), 2);
        assert_eq!(last.hits.len(), 1);
        assert_ne!(first.hits[0].id, second.hits[0].id);
        // A short window ends the sequence.
        assert!(last.cursor.is_none());
    }
}
