//! `Operation` — a business record, referenced only to bound the Store's
//! schema and give the Read API a complete accessor surface. No operation
//! *processing* happens in this crate; that is the external job worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a business operation. Advances monotonically:
/// `Pending -> Processing -> {Processed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationStatus {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// Being worked on.
    Processing,
    /// Completed successfully.
    Processed,
    /// Completed with an error.
    Failed,
}

/// A business operation, as enqueued by the external API gateway and
/// processed by the external job worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Caller-assigned id (a UUID string in the original gateway).
    pub id: String,
    /// Operation type tag, e.g. `"reserve"` or `"payment"`.
    pub op_type: String,
    /// Opaque request payload.
    pub payload: Value,
    /// Current lifecycle status.
    pub status: OperationStatus,
    /// Error detail, set only when `status == Failed`.
    pub error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
}
