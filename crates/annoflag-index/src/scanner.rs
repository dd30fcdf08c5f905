//! Windowed deep scan over the index.

use std::sync::Arc;

use tracing::debug;

use annoflag_core::defaults::SCAN_PAGE_SIZE;
use annoflag_core::{DocumentRef, Result};

use crate::client::SearchIndex;
use crate::query::FlagQuery;

/// Scans all documents matching a [`FlagQuery`], paging through the index in
/// bounded windows.
///
/// The full match set is materialized before being returned: a propagation
/// run must identify every match before any write lands, because the writes
/// themselves change what the predicate matches. Memory during the scan is
/// proportional to the window size only on the transport side; the collected
/// refs are id-only and small.
///
/// A scan is not resumable mid-sequence. On [`Error::Scan`](annoflag_core::Error::Scan)
/// the caller retries from the beginning, normally via broker redelivery of
/// the triggering message.
pub struct Scanner {
    index: Arc<dyn SearchIndex>,
    page_size: usize,
}

impl Scanner {
    /// Create a scanner over the given index handle.
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self {
            index,
            page_size: SCAN_PAGE_SIZE,
        }
    }

    /// Override the scan window size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Collect every document currently matching `query`.
    pub async fn scan(&self, query: &FlagQuery) -> Result<Vec<DocumentRef>> {
        let mut matches = Vec::new();
        let mut cursor = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .index
                .search_page(query, cursor.take(), self.page_size)
                .await?;
            pages += 1;
            let exhausted = page.hits.is_empty();
            matches.extend(page.hits);

            match page.cursor {
                Some(next) if !exhausted => cursor = Some(next),
                _ => break,
            }
        }

        debug!(
            user_id = query.user_id(),
            intent = %query.intent(),
            pages,
            matched = matches.len(),
            "Scan complete"
        );
        Ok(matches)
    }
}
