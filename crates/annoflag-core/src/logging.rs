//! Structured logging field name constants for the annoflag worker.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (partial bulk failure, bad message) |
//! | INFO  | Lifecycle events (startup, shutdown), propagation completions |
//! | DEBUG | Decision points, scan pages, config choices |
//! | TRACE | Per-document iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "index", "worker"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "scanner", "bulk", "listener", "propagate"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "scan", "bulk_apply", "run", "handle_message"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User whose annotations are being flagged/unflagged.
pub const USER_ID: &str = "user_id";

/// Flag intent ("nipsa" or "unnipsa").
pub const INTENT: &str = "intent";

/// Annotation document id being operated on.
pub const DOCUMENT_ID: &str = "document_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Documents matched by a propagation run's predicate.
pub const MATCHED: &str = "matched";

/// Bulk update instructions applied successfully.
pub const SUCCEEDED: &str = "succeeded";

/// Bulk update instructions that failed individually.
pub const FAILED: &str = "failed";

/// Number of scan pages fetched during a run.
pub const PAGES: &str = "pages";
