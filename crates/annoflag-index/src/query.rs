//! Typed flag queries.
//!
//! A [`FlagQuery`] is the selection predicate for one propagation run. The
//! two predicates for the same user are mutually exclusive: `Suppress`
//! selects annotations currently *lacking* the suppression marker,
//! `Unsuppress` selects annotations currently *carrying* it. This is what
//! makes a propagation run idempotent — a second run of the same intent
//! matches nothing.

use serde_json::{json, Value as JsonValue};

use annoflag_core::defaults::SUPPRESSED_FIELD;
use annoflag_core::{Error, FlagIntent, Result};

/// Selection predicate over `{user_id, suppression marker}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagQuery {
    user_id: String,
    intent: FlagIntent,
}

impl FlagQuery {
    /// Build the predicate for one user and intent.
    ///
    /// Fails with [`Error::InvalidInput`] if `user_id` is empty.
    pub fn for_intent(user_id: impl Into<String>, intent: FlagIntent) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user_id must not be empty".into()));
        }
        Ok(Self { user_id, intent })
    }

    /// The user this predicate selects on.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The intent this predicate serves.
    pub fn intent(&self) -> FlagIntent {
        self.intent
    }

    /// Whether a document with the given owner and marker state matches.
    ///
    /// This is the predicate's semantics in one place; in-memory index
    /// implementations evaluate it directly, the HTTP implementation renders
    /// [`Self::to_body`] and lets the index evaluate the same thing.
    pub fn matches(&self, user_id: &str, suppressed: bool) -> bool {
        if user_id != self.user_id {
            return false;
        }
        match self.intent {
            FlagIntent::Suppress => !suppressed,
            FlagIntent::Unsuppress => suppressed,
        }
    }

    /// Render as an Elasticsearch-compatible bool query body.
    pub fn to_body(&self) -> JsonValue {
        let user_term = json!({ "term": { "user": self.user_id } });
        let marker = json!({ "exists": { "field": SUPPRESSED_FIELD } });
        match self.intent {
            FlagIntent::Suppress => json!({
                "bool": { "must": [user_term], "must_not": [marker] }
            }),
            FlagIntent::Unsuppress => json!({
                "bool": { "must": [user_term, marker] }
            }),
        }
    }
}
