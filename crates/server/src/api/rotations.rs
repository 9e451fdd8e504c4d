//! `/rotations`: configured sources and per-rotation timeline views.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use oncall_core::{Entry, RotationError};

use super::{api_error, ApiError, OnParams};
use crate::sources::{SourceError, SourceKind};
use crate::state::AppState;

const UPCOMING_LIMIT: usize = 5;

#[derive(Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub kind: SourceKind,
    pub location: String,
}

#[derive(Serialize)]
pub struct RotationView {
    pub name: String,
    pub metadata: HashMap<String, String>,
    /// `None` when the rotation has no entries.
    pub current: Option<Entry>,
    pub next: Entry,
    pub upcoming: Vec<Entry>,
}

pub async fn rotations_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SourceSummary>>, ApiError> {
    let sources = state
        .sources()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(
        sources
            .into_iter()
            .map(|s| SourceSummary {
                location: s.location.to_string(),
                name: s.name,
                kind: s.kind,
            })
            .collect(),
    ))
}

pub async fn rotation_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<OnParams>,
) -> Result<Json<RotationView>, ApiError> {
    let on = params.instant()?;
    let sources = state
        .sources()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let source = sources
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Rotation not found: {}", name)))?;

    let rotation = source.load(&state.http).await.map_err(|e| {
        tracing::warn!(source = %source.name, error = %e, "Unable to read rotation");
        let status = match e {
            SourceError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SourceError::Io(_) | SourceError::Http(_) => StatusCode::BAD_GATEWAY,
        };
        api_error(status, e.to_string())
    })?;

    let current = match rotation.at(on) {
        Ok(entry) => Some(entry),
        Err(RotationError::NoEntries) => None,
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    };
    Ok(Json(RotationView {
        name: source.name.clone(),
        metadata: rotation.metadata().clone(),
        current,
        next: rotation.next(on),
        upcoming: rotation.upcoming(on, UPCOMING_LIMIT),
    }))
}
