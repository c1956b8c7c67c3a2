//! Small value-object newtypes, kept deliberately thin.
//!
//! Grounded in the teacher's domain value-object convention
//! (`sase-common::domain::value_objects`): wrap primitives that are easy to
//! mix up (a service name and a request id are both strings) so the
//! compiler catches the swap instead of a log line at 3am.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a monitored service, e.g. `"reserves"` or `"worker"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(pub String);

impl ServiceName {
    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Correlation id threaded from a scheduler tick through the broker
/// fan-out and back via the Echo. Opaque beyond equality/display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new short correlation id (`"ping-<8 hex chars>"`),
    /// mirroring the original `f"ping-{uuid4().hex[:8]}"` convention.
    pub fn generate() -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("ping-{}", &token[..8]))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
