//! Pure translation from scanned documents to update actions.

use annoflag_core::{DocumentRef, Error, FlagIntent, Result, UpdateAction, UpdateOp};

/// Map one scanned document to its idempotent update instruction.
///
/// `Suppress` produces [`UpdateOp::SetSuppressed`], `Unsuppress` produces
/// [`UpdateOp::ClearSuppressed`]. No I/O; fails only on a document ref with
/// no id.
pub fn action_for(document: &DocumentRef, intent: FlagIntent) -> Result<UpdateAction> {
    if document.id.is_empty() {
        return Err(Error::InvalidInput(
            "document reference has no id".into(),
        ));
    }
    let op = match intent {
        FlagIntent::Suppress => UpdateOp::SetSuppressed,
        FlagIntent::Unsuppress => UpdateOp::ClearSuppressed,
    };
    Ok(UpdateAction {
        document_id: document.id.clone(),
        doc_type: document.doc_type.clone(),
        op,
    })
}

/// Translate a whole match set. Order is preserved; any malformed ref fails
/// the translation before a single write is attempted.
pub fn translate(documents: &[DocumentRef], intent: FlagIntent) -> Result<Vec<UpdateAction>> {
    documents.iter().map(|d| action_for(d, intent)).collect()
}
