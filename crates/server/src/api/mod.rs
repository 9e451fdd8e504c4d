//! HTTP endpoints.
//!
//! Shared response types and query-time handling live here in mod.rs.

mod health;
mod now;
mod rotations;

use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// `?on=<RFC3339>` moves the query to another instant; defaults to now.
#[derive(Debug, Default, Deserialize)]
pub struct OnParams {
    pub on: Option<String>,
}

impl OnParams {
    pub(crate) fn instant(&self) -> Result<DateTime<FixedOffset>, ApiError> {
        match self.on.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Utc::now().fixed_offset()),
            Some(raw) => DateTime::parse_from_rfc3339(raw).map_err(|e| {
                api_error(
                    StatusCode::BAD_REQUEST,
                    format!("invalid `on` {raw:?}, expected RFC 3339: {e}"),
                )
            }),
        }
    }
}

// ── Re-exports ───────────────────────────────────────────────────
// Flat `api::foo` paths used by router.rs route registration.

pub use health::health;
pub use now::now;
pub use rotations::{rotation_detail, rotations_list};
