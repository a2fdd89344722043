//! # pf-geo-nominatim
//!
//! OpenStreetMap Nominatim implementation of `LocationService`.
//! One lookup per address, first hit wins.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pf_core::models::LatLng;
use pf_core::traits::LocationService;
use serde::Deserialize;
use tracing::debug;

/// Nominatim rejects free-text queries far beyond this.
const MAX_ADDRESS_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

pub struct NominatimLocator {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimLocator {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationService for NominatimLocator {
    async fn resolve(&self, address: &str) -> anyhow::Result<Option<LatLng>> {
        if address.len() > MAX_ADDRESS_LEN {
            anyhow::bail!("address too long (max {MAX_ADDRESS_LEN} chars)");
        }

        let results: Vec<NominatimResult> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_coordinates(results, address)
    }
}

fn first_coordinates(results: Vec<NominatimResult>, address: &str) -> anyhow::Result<Option<LatLng>> {
    let Some(first) = results.into_iter().next() else {
        debug!(address, "no geocoding results");
        return Ok(None);
    };

    let lat: f64 = first.lat.parse().context("nominatim returned a bad latitude")?;
    let lng: f64 = first.lon.parse().context("nominatim returned a bad longitude")?;
    debug!(address, resolved = %first.display_name, lat, lng, "address geocoded");

    Ok(Some(LatLng { lat, lng }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Vec<NominatimResult> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn first_hit_becomes_coordinates() {
        let results = parse(
            r#"[{"lat":"-22.9110137","lon":"-43.2093727","display_name":"Rio de Janeiro, Brasil"},
                {"lat":"0","lon":"0","display_name":"elsewhere"}]"#,
        );

        let latlng = first_coordinates(results, "Rio de Janeiro, Brazil").unwrap().unwrap();
        assert_eq!(latlng, LatLng { lat: -22.9110137, lng: -43.2093727 });
    }

    #[test]
    fn empty_answer_is_not_found() {
        assert_eq!(first_coordinates(parse("[]"), "Atlantis").unwrap(), None);
    }

    #[test]
    fn garbage_coordinates_are_errors() {
        let results = parse(r#"[{"lat":"north","lon":"1.0"}]"#);
        assert!(first_coordinates(results, "somewhere").is_err());
    }

    #[tokio::test]
    async fn overlong_address_is_refused_locally() {
        let locator = NominatimLocator::new("http://127.0.0.1:9", "pinfluence-test", Duration::from_secs(1)).unwrap();
        let address = "x".repeat(MAX_ADDRESS_LEN + 1);
        assert!(locator.resolve(&address).await.is_err());
    }
}
