//! The search-index client boundary.
//!
//! [`SearchIndex`] is an explicit handle owned by the worker process for its
//! lifetime and injected into the [`Scanner`](crate::Scanner) and
//! [`BulkMutator`](crate::BulkMutator). The index's own storage engine,
//! sharding, and query execution live behind this trait; the worker only
//! emits queries and bulk updates and observes their exit status.

use async_trait::async_trait;

use annoflag_core::{BulkResult, DocumentRef, Result, UpdateAction};

use crate::query::FlagQuery;

/// Opaque continuation token for a scan in progress.
///
/// The HTTP implementation carries a scroll id here, the in-memory one an
/// offset. Callers never look inside; they only hand the token back to fetch
/// the next window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor(String);

impl ScanCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One window of scan hits, plus the cursor for the next window (if any).
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Hits within this window, in index order.
    pub hits: Vec<DocumentRef>,
    /// Continuation token; `None` means the sequence is exhausted.
    pub cursor: Option<ScanCursor>,
}

/// Abstracts the underlying search index (Elasticsearch-shaped HTTP service,
/// in-memory test double).
///
/// Implementations are injected rather than reached through a module-level
/// global, so tests and multi-index deployments can swap them freely.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Fetch one bounded window of documents matching `query`. A `None`
    /// cursor opens a fresh scan; a `Some` cursor continues one. Only
    /// document identity is requested, no source body.
    ///
    /// The scan sequence is bounded by the index contents at scan start;
    /// implementations use a snapshot cursor (scroll) where the backend
    /// offers one, so writes landing mid-scan do not shift the windows.
    /// A page with no cursor, or with no hits, ends the sequence. Cursors
    /// are single-use and not resumable after an error; transport or query
    /// errors surface as [`Error::Scan`](annoflag_core::Error::Scan) and the
    /// caller restarts from a fresh scan.
    async fn search_page(
        &self,
        query: &FlagQuery,
        cursor: Option<ScanCursor>,
        size: usize,
    ) -> Result<ScanPage>;

    /// Submit `actions` as one transport-level batch.
    ///
    /// Individual actions succeed or fail independently; per-item outcomes
    /// are enumerated in the returned [`BulkResult`] and never raise. Only a
    /// failure to submit the batch at all surfaces as
    /// [`Error::BulkSubmit`](annoflag_core::Error::BulkSubmit). Callers must
    /// not pass an empty batch; the [`BulkMutator`](crate::BulkMutator)
    /// short-circuits that case before reaching the transport.
    async fn bulk(&self, actions: &[UpdateAction]) -> Result<BulkResult>;
}
