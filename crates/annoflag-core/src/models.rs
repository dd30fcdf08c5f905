//! Data models for flag propagation.
//!
//! These are the types that flow between the queue boundary, the propagation
//! orchestrator, and the search-index boundary. All of them are transient,
//! created per run and discarded after the bulk write; the only durable state
//! in the system is the suppression marker on each annotation document,
//! which the index owns.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What a queue message asks the worker to do to a user's annotations.
///
/// Serializes to/from the wire values `"nipsa"` / `"unnipsa"` used by the
/// queue payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagIntent {
    /// Set the suppression marker on every annotation the user owns.
    #[serde(rename = "nipsa")]
    Suppress,
    /// Remove the suppression marker from every annotation the user owns.
    #[serde(rename = "unnipsa")]
    Unsuppress,
}

impl FlagIntent {
    /// The wire value this intent carries in queue payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagIntent::Suppress => "nipsa",
            FlagIntent::Unsuppress => "unnipsa",
        }
    }
}

impl std::fmt::Display for FlagIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded queue message: flag or unflag one user.
///
/// Wire shape: `{"user_id": "acct:alice@example.com", "action": "nipsa"}`.
/// Anything else (missing keys, unknown keys, unknown action values) is a
/// decode error and the message is permanently undeliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueMessage {
    /// The user whose annotations are affected.
    pub user_id: String,
    /// What to do to them.
    pub action: FlagIntent,
}

impl QueueMessage {
    /// Decode a raw queue payload.
    pub fn decode(payload: &str) -> Result<Self> {
        let message: QueueMessage = serde_json::from_str(payload)
            .map_err(|e| Error::Decode(format!("bad queue payload: {e}")))?;
        if message.user_id.is_empty() {
            return Err(Error::Decode("queue payload has empty user_id".into()));
        }
        Ok(message)
    }
}

/// Minimal identifying handle for an indexed annotation, as returned by a
/// scan. The scanner requests no document body, so this is all there is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Opaque index-assigned document id.
    pub id: String,
    /// Index document type.
    pub doc_type: String,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doc_type: doc_type.into(),
        }
    }
}

/// The partial-update operation an [`UpdateAction`] applies.
///
/// Both operations are idempotent: setting an already-set marker and
/// clearing an absent marker are successful no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    /// Set the suppression marker to true.
    SetSuppressed,
    /// Remove the suppression marker if present.
    ClearSuppressed,
}

/// One idempotent update instruction for the bulk mutator.
///
/// Produced per matched document, immutable once built, consumed exactly
/// once by the bulk write. How the operation maps onto the index's partial
/// update mechanism (doc merge vs. script) is the transport's concern, not
/// the caller's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAction {
    /// Target document.
    pub document_id: String,
    /// Target document type.
    pub doc_type: String,
    /// What to do to it.
    pub op: UpdateOp,
}

/// Outcome of a single action within a bulk batch that did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Document the failed action targeted.
    pub document_id: String,
    /// Index-reported reason.
    pub reason: String,
}

/// Per-item outcome of a bulk write.
///
/// A batch is atomic at the transport level only: individual actions succeed
/// or fail independently, and item failures never abort the rest of the
/// batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResult {
    /// Actions that applied.
    pub succeeded: usize,
    /// Actions that did not, with reasons.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkResult {
    /// Number of actions that failed individually.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total actions the batch carried.
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// True when every action applied.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated outcome of one propagation run.
#[derive(Debug, Clone)]
pub struct PropagationOutcome {
    /// User the run targeted.
    pub user_id: String,
    /// Intent the run applied.
    pub intent: FlagIntent,
    /// Documents the predicate matched at scan time.
    pub matched: usize,
    /// Updates that applied.
    pub succeeded: usize,
    /// Updates that failed individually (not retried by this run).
    pub failed: usize,
    /// The specific item failures, if any.
    pub failures: Vec<BulkItemFailure>,
}

impl PropagationOutcome {
    /// True when the run matched nothing or every update applied.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nipsa_message() {
        let msg = QueueMessage::decode(r#"{"user_id": "acct:alice", "action": "nipsa"}"#).unwrap();
        assert_eq!(msg.user_id, "acct:alice");
        assert_eq!(msg.action, FlagIntent::Suppress);
    }

    #[test]
    fn test_decode_unnipsa_message() {
        let msg =
            QueueMessage::decode(r#"{"user_id": "acct:bob", "action": "unnipsa"}"#).unwrap();
        assert_eq!(msg.action, FlagIntent::Unsuppress);
    }

    #[test]
    fn test_decode_rejects_missing_user_id() {
        let err = QueueMessage::decode(r#"{"action": "nipsa"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_empty_user_id() {
        let err = QueueMessage::decode(r#"{"user_id": "", "action": "nipsa"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let err =
            QueueMessage::decode(r#"{"user_id": "acct:alice", "action": "ban"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_keys() {
        let err = QueueMessage::decode(
            r#"{"user_id": "acct:alice", "action": "nipsa", "extra": true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(QueueMessage::decode("[1, 2, 3]").is_err());
        assert!(QueueMessage::decode("not json at all").is_err());
    }

    #[test]
    fn test_intent_wire_values_round_trip() {
        assert_eq!(FlagIntent::Suppress.as_str(), "nipsa");
        assert_eq!(FlagIntent::Unsuppress.as_str(), "unnipsa");
        let json = serde_json::to_string(&FlagIntent::Suppress).unwrap();
        assert_eq!(json, r#""nipsa""#);
    }

    #[test]
    fn test_bulk_result_counts() {
        let result = BulkResult {
            succeeded: 2,
            failures: vec![BulkItemFailure {
                document_id: "a1".into(),
                reason: "version conflict".into(),
            }],
        };
        assert_eq!(result.failed(), 1);
        assert_eq!(result.total(), 3);
        assert!(!result.is_clean());
        assert!(BulkResult::default().is_clean());
    }
}
