//! Elasticsearch-shaped HTTP implementation of [`SearchIndex`].
//!
//! Scans use the scroll API: the first `_search` call opens a snapshot
//! cursor, continuation calls walk it. Plain `from`/`size` paging would be
//! capped by the index's `max_result_window` and would shift under
//! concurrent writes; a scroll is bounded by the index contents at scan
//! start, which is what a propagation run needs.
//!
//! Bulk writes speak `_bulk`. The suppression marker is a plain field:
//! setting it is a `doc` partial update, clearing it is a field-removal
//! script. That scripting detail stays inside this module; callers only see
//! typed [`UpdateAction`]s.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, trace};

use annoflag_core::defaults::{ANNOTATION_TYPE, SCAN_SCROLL_TTL, SUPPRESSED_FIELD};
use annoflag_core::{BulkItemFailure, BulkResult, DocumentRef, Error, Result, UpdateAction, UpdateOp};

use crate::client::{ScanCursor, ScanPage, SearchIndex};
use crate::query::FlagQuery;

/// HTTP handle to an Elasticsearch-compatible index.
pub struct HttpSearchIndex {
    http: reqwest::Client,
    base_url: String,
    index: String,
}

impl HttpSearchIndex {
    /// Create a handle for the index at `base_url` (e.g.
    /// `http://localhost:9200`).
    pub fn new(base_url: impl Into<String>, index: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}/{}/_search?scroll={}",
            self.base_url, self.index, ANNOTATION_TYPE, SCAN_SCROLL_TTL
        )
    }

    fn scroll_url(&self) -> String {
        format!("{}/_search/scroll", self.base_url)
    }

    fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.base_url)
    }

    /// Release a finished scroll context. Best effort: the context expires
    /// on its own after [`SCAN_SCROLL_TTL`] anyway.
    async fn clear_scroll(&self, scroll_id: &str) {
        let outcome = self
            .http
            .delete(self.scroll_url())
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;
        if let Err(e) = outcome {
            debug!(error = %e, "Failed to clear scroll context");
        }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn search_page(
        &self,
        query: &FlagQuery,
        cursor: Option<ScanCursor>,
        size: usize,
    ) -> Result<ScanPage> {
        let (url, body) = match &cursor {
            None => (self.search_url(), search_body(query, size)),
            Some(cursor) => (self.scroll_url(), scroll_body(cursor)),
        };
        trace!(continuing = cursor.is_some(), size, "Fetching scan page");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Scan(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Scan(format!("search returned {status}: {text}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Scan(format!("bad search response: {e}")))?;

        let hits: Vec<DocumentRef> = parsed
            .hits
            .hits
            .into_iter()
            .map(|h| {
                DocumentRef::new(h.id, h.doc_type.unwrap_or_else(|| ANNOTATION_TYPE.to_string()))
            })
            .collect();

        let cursor = if hits.is_empty() {
            if let Some(ref scroll_id) = parsed.scroll_id {
                self.clear_scroll(scroll_id).await;
            }
            None
        } else {
            parsed.scroll_id.map(ScanCursor::new)
        };
        Ok(ScanPage { hits, cursor })
    }

    async fn bulk(&self, actions: &[UpdateAction]) -> Result<BulkResult> {
        let body = bulk_body(&self.index, actions)?;

        let response = self
            .http
            .post(self.bulk_url())
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::BulkSubmit(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::BulkSubmit(format!("bulk returned {status}: {text}")));
        }

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| Error::BulkSubmit(format!("bad bulk response: {e}")))?;
        Ok(collect_bulk_result(parsed))
    }
}

/// Render the `_search` request body that opens a scroll.
///
/// `_source: false` keeps the payload to document identity only, and the
/// `_doc` sort makes the scroll walk in the cheapest order.
fn search_body(query: &FlagQuery, size: usize) -> JsonValue {
    json!({
        "query": query.to_body(),
        "size": size,
        "sort": ["_doc"],
        "_source": false,
    })
}

/// Render a scroll continuation request.
fn scroll_body(cursor: &ScanCursor) -> JsonValue {
    json!({
        "scroll": SCAN_SCROLL_TTL,
        "scroll_id": cursor.as_str(),
    })
}

/// Render the NDJSON `_bulk` request body.
fn bulk_body(index: &str, actions: &[UpdateAction]) -> Result<String> {
    let mut body = String::new();
    for action in actions {
        let header = json!({
            "update": {
                "_index": index,
                "_type": action.doc_type,
                "_id": action.document_id,
            }
        });
        let payload = match action.op {
            UpdateOp::SetSuppressed => json!({ "doc": { SUPPRESSED_FIELD: true } }),
            UpdateOp::ClearSuppressed => json!({
                "script": format!("ctx._source.remove(\"{SUPPRESSED_FIELD}\")")
            }),
        };
        body.push_str(&serde_json::to_string(&header)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&payload)?);
        body.push('\n');
    }
    Ok(body)
}

fn collect_bulk_result(response: BulkResponse) -> BulkResult {
    let mut result = BulkResult::default();
    for item in response.items {
        let status = item.update.status;
        if status < 400 {
            result.succeeded += 1;
        } else {
            let reason = item
                .update
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("status {status}"));
            result.failures.push(BulkItemFailure {
                document_id: item.update.id,
                reason,
            });
        }
    }
    result
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHitsEnvelope,
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHitsEnvelope {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_type", default)]
    doc_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<BulkResponseItem>,
}

#[derive(Debug, Deserialize)]
struct BulkResponseItem {
    update: BulkItemStatus,
}

#[derive(Debug, Deserialize)]
struct BulkItemStatus {
    #[serde(rename = "_id")]
    id: String,
    status: u16,
    #[serde(default)]
    error: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use annoflag_core::FlagIntent;

    fn action(id: &str, op: UpdateOp) -> UpdateAction {
        UpdateAction {
            document_id: id.to_string(),
            doc_type: ANNOTATION_TYPE.to_string(),
            op,
        }
    }

    #[test]
    fn test_search_body_requests_identity_only() {
        let query = FlagQuery::for_intent("acct:alice", FlagIntent::Suppress).unwrap();
        let body = search_body(&query, 100);
        assert_eq!(body["size"], 100);
        assert_eq!(body["_source"], false);
        assert_eq!(body["sort"][0], "_doc");
        // Depth comes from the scroll cursor, not an offset.
        assert!(body.get("from").is_none());
    }

    #[test]
    fn test_scroll_body_carries_cursor_and_ttl() {
        let body = scroll_body(&ScanCursor::new("c2Nyb2xsLWlk"));
        assert_eq!(body["scroll"], SCAN_SCROLL_TTL);
        assert_eq!(body["scroll_id"], "c2Nyb2xsLWlk");
    }

    #[test]
    fn test_bulk_body_set_action_shape() {
        let body = bulk_body("annotator", &[action("a1", UpdateOp::SetSuppressed)]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        let header: JsonValue = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["update"]["_index"], "annotator");
        assert_eq!(header["update"]["_type"], "annotation");
        assert_eq!(header["update"]["_id"], "a1");

        let payload: JsonValue = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(payload["doc"][SUPPRESSED_FIELD], true);
    }

    #[test]
    fn test_bulk_body_clear_action_uses_removal_script() {
        let body = bulk_body("annotator", &[action("a1", UpdateOp::ClearSuppressed)]).unwrap();
        let payload: JsonValue = serde_json::from_str(body.lines().nth(1).unwrap()).unwrap();
        let script = payload["script"].as_str().unwrap();
        assert!(script.contains("ctx._source.remove"));
        assert!(script.contains(SUPPRESSED_FIELD));
    }

    #[test]
    fn test_bulk_body_ends_with_newline() {
        let body = bulk_body("annotator", &[action("a1", UpdateOp::SetSuppressed)]).unwrap();
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_collect_bulk_result_partial_failure() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [
                { "update": { "_id": "a1", "status": 200 } },
                { "update": { "_id": "a2", "status": 409,
                              "error": { "type": "version_conflict_engine_exception" } } },
                { "update": { "_id": "a3", "status": 200 } },
            ]
        }))
        .unwrap();

        let result = collect_bulk_result(response);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.failures[0].document_id, "a2");
        assert!(result.failures[0].reason.contains("version_conflict"));
    }

    #[test]
    fn test_search_response_parses_hits_and_scroll_id() {
        let parsed: SearchResponse = serde_json::from_value(json!({
            "_scroll_id": "c2Nyb2xsLWlk",
            "hits": {
                "total": 2,
                "hits": [
                    { "_id": "a1", "_type": "annotation" },
                    { "_id": "a2" },
                ]
            }
        }))
        .unwrap();
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].id, "a1");
        assert!(parsed.hits.hits[1].doc_type.is_none());
        assert_eq!(parsed.scroll_id.as_deref(), Some("c2Nyb2xsLWlk"));
    }

    #[test]
    fn test_search_response_without_scroll_id_still_parses() {
        let parsed: SearchResponse = serde_json::from_value(json!({
            "hits": { "hits": [] }
        }))
        .unwrap();
        assert!(parsed.hits.hits.is_empty());
        assert!(parsed.scroll_id.is_none());
    }
}
