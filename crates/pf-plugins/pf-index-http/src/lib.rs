//! # pf-index-http
//!
//! `InfluencerIndexer` implementations. `HttpIndexer` upserts one JSON
//! document per influencer into a search service; `LogIndexer` stands in when
//! no service is configured.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pf_core::models::Influencer;
use pf_core::traits::InfluencerIndexer;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;

/// The searchable projection of an influencer.
#[derive(Debug, Serialize, PartialEq)]
struct InfluencerDocument<'a> {
    id: i64,
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<&'a str>,
    earliest_date: Option<NaiveDate>,
}

impl<'a> From<&'a Influencer> for InfluencerDocument<'a> {
    fn from(influencer: &'a Influencer) -> Self {
        Self {
            id: influencer.id(),
            kind: influencer.kind().as_str(),
            name: influencer.name(),
            gender: influencer.gender(),
            earliest_date: influencer.earliest_date(),
        }
    }
}

pub struct HttpIndexer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpIndexer {
    pub fn new(base_url: &str, api_key: Option<SecretString>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn document_url(&self, influencer: &Influencer) -> String {
        format!("{}/influencers/{}", self.base_url, influencer.key())
    }
}

#[async_trait]
impl InfluencerIndexer for HttpIndexer {
    async fn save(&self, influencer: &Influencer) -> anyhow::Result<()> {
        let mut request = self
            .client
            .put(self.document_url(influencer))
            .json(&InfluencerDocument::from(influencer));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        request.send().await?.error_for_status()?;
        info!(influencer = %influencer.key(), "influencer indexed");
        Ok(())
    }
}

/// Records what would have been indexed.
pub struct LogIndexer;

#[async_trait]
impl InfluencerIndexer for LogIndexer {
    async fn save(&self, influencer: &Influencer) -> anyhow::Result<()> {
        info!(
            influencer = %influencer.key(),
            name = influencer.name(),
            "no search index configured, skipping"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::models::{Event, Person};

    #[test]
    fn person_document_carries_gender() {
        let person = Influencer::Person(Person {
            id: 3,
            name: "Ada Lovelace".into(),
            gender: Some("female".into()),
            earliest_date: NaiveDate::from_ymd_opt(1815, 12, 10),
        });

        let json = serde_json::to_value(InfluencerDocument::from(&person)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "type": "Person",
                "name": "Ada Lovelace",
                "gender": "female",
                "earliest_date": "1815-12-10"
            })
        );
    }

    #[test]
    fn event_document_has_no_gender() {
        let event = Influencer::Event(Event {
            id: 8,
            name: "Treaty of Tordesillas".into(),
            earliest_date: None,
        });

        let json = serde_json::to_value(InfluencerDocument::from(&event)).unwrap();
        assert!(json.get("gender").is_none());
        assert_eq!(json["type"], "Event");
    }

    #[test]
    fn documents_are_addressed_by_kind_and_id() {
        let indexer = HttpIndexer::new("http://search.local/", None, Duration::from_secs(1)).unwrap();
        let event = Influencer::Event(Event {
            id: 8,
            name: "Treaty of Tordesillas".into(),
            earliest_date: None,
        });
        assert_eq!(indexer.document_url(&event), "http://search.local/influencers/event-8");
    }

    #[tokio::test]
    async fn log_indexer_never_fails() {
        let event = Influencer::Event(Event {
            id: 1,
            name: "Fall of Constantinople".into(),
            earliest_date: None,
        });
        assert!(LogIndexer.save(&event).await.is_ok());
    }
}
