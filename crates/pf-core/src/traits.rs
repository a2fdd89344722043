//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    Influencer, InfluencerKey, InfluencerKind, LatLng, Location, Moment, MomentDraft,
    NewInfluencer, RecordedMoment,
};

/// Data persistence contract for people and events.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InfluencerRepo: Send + Sync {
    /// Inserts a person or event with no moments yet.
    async fn create_influencer(&self, influencer: NewInfluencer) -> anyhow::Result<Influencer>;
    async fn find_influencer(&self, key: InfluencerKey) -> anyhow::Result<Option<Influencer>>;
    /// All people and events, ordered by name ascending.
    async fn all_ordered_by_name(&self) -> anyhow::Result<Vec<Influencer>>;
    async fn search_by_name(&self, kind: InfluencerKind, name: &str) -> anyhow::Result<Vec<Influencer>>;
}

/// Data persistence contract for moments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MomentRepo: Send + Sync {
    /// Writes the influencer (when new), the moment, its locations and the
    /// influencer's `earliest_date` in a single transaction.
    async fn record_moment(&self, draft: MomentDraft) -> anyhow::Result<RecordedMoment>;
    async fn find_moment(&self, id: i64) -> anyhow::Result<Option<Moment>>;
    /// Moments of one influencer, oldest first.
    async fn search_by_influencer(&self, key: InfluencerKey) -> anyhow::Result<Vec<Moment>>;
    async fn all_moments(&self) -> anyhow::Result<Vec<Moment>>;
    /// Removes a moment with its locations and recomputes the owner's
    /// `earliest_date`. Returns false if no such moment existed.
    async fn delete_moment(&self, id: i64) -> anyhow::Result<bool>;
}

/// Data persistence contract for locations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocationRepo: Send + Sync {
    async fn by_moment(&self, moment_id: i64) -> anyhow::Result<Vec<Location>>;
    /// Batched variant used by the GraphQL data loader.
    async fn by_moments(&self, moment_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<Location>>>;
}

/// Geocoding contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Resolves a free-text address. `Ok(None)` means the service answered
    /// but knows no such place.
    async fn resolve(&self, address: &str) -> anyhow::Result<Option<LatLng>>;
}

/// Search-index hook, run after a new influencer is committed.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InfluencerIndexer: Send + Sync {
    async fn save(&self, influencer: &Influencer) -> anyhow::Result<()>;
}

/// Admin identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies staff/admin credentials
    async fn verify_admin(&self, username: &str, password: &str) -> bool;
}

/// The repository set handed to interactors and the API layer.
#[derive(Clone)]
pub struct Repositories {
    pub influencers: Arc<dyn InfluencerRepo>,
    pub moments: Arc<dyn MomentRepo>,
    pub locations: Arc<dyn LocationRepo>,
}

impl Repositories {
    /// Shares one store implementing every repository port.
    pub fn from_store<S>(store: S) -> Self
    where
        S: InfluencerRepo + MomentRepo + LocationRepo + 'static,
    {
        let store = Arc::new(store);
        Self {
            influencers: store.clone(),
            moments: store.clone(),
            locations: store,
        }
    }
}
