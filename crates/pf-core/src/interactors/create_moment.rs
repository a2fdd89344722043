//! # CreateMoment
//!
//! Records a moment for a new or existing influencer.
//!
//! # Developer Note
//! Every address is geocoded before anything is written, and the writes go
//! through a single `MomentRepo::record_moment` transaction. A failure at any
//! point therefore leaves no rows behind, including a freshly drafted person
//! or event.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    InfluencerKey, InfluencerKind, InfluencerSelector, MomentDraft, NewInfluencer, NewLocation,
    RecordedMoment,
};
use crate::traits::{InfluencerIndexer, InfluencerRepo, LocationService, MomentRepo};

/// Either `{id, type}` for an existing influencer or `{name, type, gender?}`
/// for a new one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluencerParams {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    pub gender: Option<String>,
}

impl InfluencerParams {
    /// Drafts a new influencer from `name`/`gender`; gender is dropped for events.
    pub(crate) fn new_influencer(&self, kind: InfluencerKind) -> Result<NewInfluencer> {
        let name = non_blank(self.name.as_deref()).ok_or_else(|| {
            AppError::ValidationError("a new influencer needs a name".into())
        })?;

        Ok(match kind {
            InfluencerKind::Person => NewInfluencer::Person {
                name,
                gender: non_blank(self.gender.as_deref()),
            },
            InfluencerKind::Event => NewInfluencer::Event { name },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MomentParams {
    pub date_begin: String,
    pub date_end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    pub address: String,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMomentInput {
    pub influencer: InfluencerParams,
    pub moment: MomentParams,
    #[serde(default)]
    pub locations: Vec<LocationParams>,
}

pub struct CreateMoment {
    influencers: Arc<dyn InfluencerRepo>,
    moments: Arc<dyn MomentRepo>,
    location_service: Arc<dyn LocationService>,
    indexer: Arc<dyn InfluencerIndexer>,
}

impl CreateMoment {
    pub fn new(
        influencers: Arc<dyn InfluencerRepo>,
        moments: Arc<dyn MomentRepo>,
        location_service: Arc<dyn LocationService>,
        indexer: Arc<dyn InfluencerIndexer>,
    ) -> Self {
        Self {
            influencers,
            moments,
            location_service,
            indexer,
        }
    }

    pub async fn call(&self, input: CreateMomentInput) -> Result<RecordedMoment> {
        // 1. Validation: dates and influencer selection
        let date_begin = parse_date("date_begin", &input.moment.date_begin)?;
        let date_end = match input.moment.date_end.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date("date_end", raw)?),
        };
        let influencer = self.resolve_influencer(&input.influencer).await?;

        // 2. Geocoding: fails the whole call on the first unknown address
        let mut locations = Vec::with_capacity(input.locations.len());
        for params in &input.locations {
            if let Some(id) = params.id {
                debug!(location_id = id, "ignoring location id on creation");
            }
            locations.push(self.geocode(&params.address).await?);
        }

        // 3. Persistence: influencer, moment, locations and earliest_date at once
        let recorded = self
            .moments
            .record_moment(MomentDraft {
                influencer,
                date_begin,
                date_end,
                locations,
            })
            .await
            .map_err(AppError::Storage)?;

        info!(
            moment_id = recorded.moment.id,
            influencer = %recorded.influencer.key(),
            locations = recorded.locations.len(),
            "moment created"
        );

        // 4. Indexing: only for influencers created by this call
        if recorded.influencer_created {
            if let Err(e) = self.indexer.save(&recorded.influencer).await {
                warn!(influencer = %recorded.influencer.key(), error = %e, "influencer indexing failed");
            }
        }

        Ok(recorded)
    }

    async fn resolve_influencer(&self, params: &InfluencerParams) -> Result<InfluencerSelector> {
        let kind: InfluencerKind = params.kind.parse()?;

        if let Some(id) = params.id {
            let key = InfluencerKey::new(kind, id);
            return match self
                .influencers
                .find_influencer(key)
                .await
                .map_err(AppError::Storage)?
            {
                Some(_) => Ok(InfluencerSelector::Existing(key)),
                None => Err(AppError::NotFound(kind.to_string(), id.to_string())),
            };
        }

        Ok(InfluencerSelector::New(params.new_influencer(kind)?))
    }

    async fn geocode(&self, address: &str) -> Result<NewLocation> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(NewLocation {
                address: String::new(),
                latlng: None,
            });
        }

        let latlng = self
            .location_service
            .resolve(address)
            .await
            .map_err(AppError::Geocoder)?
            .ok_or_else(|| AppError::LocationAddressNotFound(address.to_string()))?;

        Ok(NewLocation {
            address: address.to_string(),
            latlng: Some(latlng),
        })
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::ValidationError(format!("{field} '{raw}': {e}")))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
