//! Centralized default constants for the annoflag worker.
//!
//! **This module is the single source of truth** for all shared default
//! values. The index and worker crates reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// INDEX
// =============================================================================

/// Default Elasticsearch-compatible index name holding annotation documents.
pub const INDEX_NAME: &str = "annotator";

/// Document type for annotation documents.
pub const ANNOTATION_TYPE: &str = "annotation";

/// Marker field set on suppressed annotations. Presence = suppressed,
/// absence = visible.
pub const SUPPRESSED_FIELD: &str = "not_in_public_site_areas";

// =============================================================================
// SCANNING
// =============================================================================

/// Window size for deep scans. Memory use during a scan is proportional to
/// this, not to the total match count.
pub const SCAN_PAGE_SIZE: usize = 200;

/// How long the index keeps a scroll context alive between scan windows.
pub const SCAN_SCROLL_TTL: &str = "1m";

// =============================================================================
// QUEUE
// =============================================================================

/// Queue holding user flag/unflag requests.
pub const QUEUE_NAME: &str = "nipsa_user_requests";

/// Channel this worker subscribes to on [`QUEUE_NAME`].
pub const QUEUE_CHANNEL: &str = "nipsa_users_annotations";

/// In-process queue channel capacity.
pub const QUEUE_CAPACITY: usize = 64;

// =============================================================================
// EVENTS
// =============================================================================

/// Capacity of the listener's broadcast event bus.
pub const EVENT_BUS_CAPACITY: usize = 64;
