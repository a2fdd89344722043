//! # Admin Handlers
//!
//! JSON curation endpoints. Every route here sits behind
//! [`crate::middleware::require_admin`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pf_core::error::AppError;
use pf_core::interactors::{CreateMomentInput, InfluencerParams};
use pf_core::models::{Influencer, InfluencerKey, Moment, RecordedMoment};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MomentFilter {
    pub influencer_id: Option<i64>,
    pub influencer_type: Option<String>,
}

pub async fn list_influencers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Influencer>>, ApiError> {
    Ok(Json(state.list_influencers.call().await?))
}

/// Adds a person or event that has no moments yet.
pub async fn create_influencer(
    State(state): State<Arc<AppState>>,
    Json(params): Json<InfluencerParams>,
) -> Result<(StatusCode, Json<Influencer>), ApiError> {
    let created = state.create_influencer.call(params).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_moments(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MomentFilter>,
) -> Result<Json<Vec<Moment>>, ApiError> {
    let moments = match InfluencerKey::from_filter(filter.influencer_id, filter.influencer_type.as_deref())? {
        Some(key) => state.repos.moments.search_by_influencer(key).await,
        None => state.repos.moments.all_moments().await,
    }
    .map_err(AppError::Storage)?;

    Ok(Json(moments))
}

/// Orchestrates the creation of a new moment and, possibly, its influencer.
pub async fn create_moment(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateMomentInput>,
) -> Result<(StatusCode, Json<RecordedMoment>), ApiError> {
    let recorded = state.create_moment.call(input).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn delete_moment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .repos
        .moments
        .delete_moment(id)
        .await
        .map_err(AppError::Storage)?;

    if !deleted {
        return Err(AppError::NotFound("Moment".into(), id.to_string()).into());
    }
    info!(moment_id = id, "moment deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
