use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::interactors::InfluencerParams;
use crate::models::{Influencer, InfluencerKind};
use crate::traits::{InfluencerIndexer, InfluencerRepo};

/// Adds a person or event without any moment, then indexes it.
pub struct CreateInfluencer {
    repository: Arc<dyn InfluencerRepo>,
    indexer: Arc<dyn InfluencerIndexer>,
}

impl CreateInfluencer {
    pub fn new(repository: Arc<dyn InfluencerRepo>, indexer: Arc<dyn InfluencerIndexer>) -> Self {
        Self { repository, indexer }
    }

    pub async fn call(&self, params: InfluencerParams) -> Result<Influencer> {
        if params.id.is_some() {
            return Err(AppError::ValidationError(
                "a new influencer cannot carry an id".into(),
            ));
        }
        let kind: InfluencerKind = params.kind.parse()?;
        let draft = params.new_influencer(kind)?;

        let influencer = self
            .repository
            .create_influencer(draft)
            .await
            .map_err(AppError::Storage)?;
        info!(influencer = %influencer.key(), name = influencer.name(), "influencer created");

        if let Err(e) = self.indexer.save(&influencer).await {
            warn!(influencer = %influencer.key(), error = %e, "influencer indexing failed");
        }
        Ok(influencer)
    }
}
