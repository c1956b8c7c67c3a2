//! Route handlers, one module per resource, mirroring the teacher's
//! `api/src/routes/` layout.

pub mod control;
pub mod health;
pub mod health_checks;
pub mod incidents;
pub mod metrics;
pub mod operations;
pub mod status;

use crate::models::ApiError;
use serde::Deserialize;

/// `?window_hours=H` — defaults to a trailing day, per the common
/// dashboard convention; `0` is a valid boundary case (§8) that yields
/// `None` metrics rather than a divide-by-zero, so it is not rejected
/// here. Negative values are rejected as caller error.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    window_hours: Option<f64>,
}

impl WindowQuery {
    pub fn resolve(&self) -> Result<f64, ApiError> {
        let hours = self.window_hours.unwrap_or(24.0);
        if hours < 0.0 {
            return Err(ApiError::bad_request("window_hours must be >= 0"));
        }
        Ok(hours)
    }
}

/// `?limit=L` — bounds the number of rows a list endpoint returns.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

impl LimitQuery {
    pub fn resolve(&self, default: usize) -> Result<usize, ApiError> {
        match self.limit {
            None => Ok(default),
            Some(n) if n > 0 => Ok(n as usize),
            Some(_) => Err(ApiError::bad_request("limit must be > 0")),
        }
    }
}
