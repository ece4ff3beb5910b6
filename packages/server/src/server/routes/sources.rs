//! Source registry CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domains::source::models::{CreateSource, IngestionSource, SourceError, SourcePatch};
use crate::server::app::AppState;

fn error_body(message: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message.to_string() }))
}

fn map_source_error(e: SourceError) -> Response {
    let status = match &e {
        SourceError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
        SourceError::InvalidType(_)
        | SourceError::ImmutableType
        | SourceError::MissingField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SourceError::NotFound(_) => StatusCode::NOT_FOUND,
        SourceError::Db(e) => {
            tracing::error!(error = %e, "source registry database error");
            return (StatusCode::INTERNAL_SERVER_ERROR, error_body("internal error"))
                .into_response();
        }
    };
    (status, error_body(e)).into_response()
}

pub async fn create_source(
    State(state): State<AppState>,
    Json(input): Json<CreateSource>,
) -> Response {
    match IngestionSource::create(&input, &state.deps.db_pool).await {
        Ok(source) => (StatusCode::CREATED, Json(source)).into_response(),
        Err(e) => map_source_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub active: bool,
}

pub async fn list_sources(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    match IngestionSource::list(params.active, &state.deps.db_pool).await {
        Ok(sources) => Json(sources).into_response(),
        Err(e) => map_source_error(e),
    }
}

pub async fn get_source(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match IngestionSource::find_by_id(id, &state.deps.db_pool).await {
        Ok(Some(source)) => Json(source).into_response(),
        Ok(None) => map_source_error(SourceError::NotFound(id)),
        Err(e) => map_source_error(e),
    }
}

pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    // source_type is immutable; reject rather than silently ignore.
    if body.get("source_type").is_some() {
        return map_source_error(SourceError::ImmutableType);
    }

    let patch: SourcePatch = match serde_json::from_value(body) {
        Ok(patch) => patch,
        Err(e) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, error_body(e)).into_response();
        }
    };

    match IngestionSource::update(id, &patch, &state.deps.db_pool).await {
        Ok(source) => Json(source).into_response(),
        Err(e) => map_source_error(e),
    }
}

pub async fn deactivate_source(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match IngestionSource::deactivate(id, &state.deps.db_pool).await {
        Ok(source) => Json(source).into_response(),
        Err(e) => map_source_error(e),
    }
}
