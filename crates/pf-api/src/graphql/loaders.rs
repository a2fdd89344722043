use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;

use pf_core::models::Location;
use pf_core::traits::LocationRepo;

// --- LocationsByMomentLoader ---

pub struct LocationsByMomentLoader {
    pub locations: Arc<dyn LocationRepo>,
}

impl Loader<i64> for LocationsByMomentLoader {
    type Value = Vec<Location>;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        self.locations.by_moments(keys).await.map_err(Arc::new)
    }
}
