//! Shared fixtures: an in-memory store and a geocoder that knows a fixed
//! set of addresses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pf_core::interactors::{CreateMoment, CreateMomentInput, InfluencerParams, LocationParams, MomentParams};
use pf_core::models::{InfluencerKey, LatLng};
use pf_core::traits::{InfluencerIndexer, LocationService, Repositories};
use pf_db_sqlite::SqliteStore;

pub async fn repositories() -> Repositories {
    let store = SqliteStore::new("sqlite::memory:")
        .await
        .expect("in-memory store");
    Repositories::from_store(store)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Resolves only the addresses it was built with and counts every call.
#[derive(Default)]
pub struct FixedGeocoder {
    known: HashMap<String, LatLng>,
    calls: AtomicUsize,
}

impl FixedGeocoder {
    pub fn with(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.known.insert(address.to_string(), LatLng { lat, lng });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationService for FixedGeocoder {
    async fn resolve(&self, address: &str) -> anyhow::Result<Option<LatLng>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.known.get(address).copied())
    }
}

pub struct NoopIndexer;

#[async_trait]
impl InfluencerIndexer for NoopIndexer {
    async fn save(&self, _influencer: &pf_core::models::Influencer) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn create_moment(repos: &Repositories, geocoder: Arc<FixedGeocoder>) -> CreateMoment {
    CreateMoment::new(
        repos.influencers.clone(),
        repos.moments.clone(),
        geocoder,
        Arc::new(NoopIndexer),
    )
}

pub fn new_influencer(kind: &str, name: &str, gender: Option<&str>) -> InfluencerParams {
    InfluencerParams {
        id: None,
        kind: kind.into(),
        name: Some(name.into()),
        gender: gender.map(Into::into),
    }
}

pub fn existing(key: InfluencerKey) -> InfluencerParams {
    InfluencerParams {
        id: Some(key.id),
        kind: key.kind.to_string(),
        ..Default::default()
    }
}

pub fn moment_input(
    influencer: InfluencerParams,
    date_begin: &str,
    date_end: Option<&str>,
    addresses: &[&str],
) -> CreateMomentInput {
    CreateMomentInput {
        influencer,
        moment: MomentParams {
            date_begin: date_begin.into(),
            date_end: date_end.map(Into::into),
        },
        locations: addresses
            .iter()
            .map(|address| LocationParams {
                address: address.to_string(),
                id: None,
            })
            .collect(),
    }
}
