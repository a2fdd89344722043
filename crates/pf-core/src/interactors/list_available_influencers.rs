use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Influencer;
use crate::traits::InfluencerRepo;

/// Every person and event, ordered by name.
pub struct ListAvailableInfluencers {
    repository: Arc<dyn InfluencerRepo>,
}

impl ListAvailableInfluencers {
    pub fn new(repository: Arc<dyn InfluencerRepo>) -> Self {
        Self { repository }
    }

    pub async fn call(&self) -> Result<Vec<Influencer>> {
        self.repository
            .all_ordered_by_name()
            .await
            .map_err(AppError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, Person};
    use crate::traits::MockInfluencerRepo;

    #[tokio::test]
    async fn returns_repository_order_untouched() {
        let mut repo = MockInfluencerRepo::new();
        repo.expect_all_ordered_by_name().times(1).returning(|| {
            Ok(vec![
                Influencer::Person(Person {
                    id: 2,
                    name: "Ada Lovelace".into(),
                    gender: Some("female".into()),
                    earliest_date: None,
                }),
                Influencer::Event(Event {
                    id: 1,
                    name: "Battle of Hastings".into(),
                    earliest_date: None,
                }),
            ])
        });

        let names: Vec<String> = ListAvailableInfluencers::new(Arc::new(repo))
            .call()
            .await
            .unwrap()
            .iter()
            .map(|i| i.name().to_string())
            .collect();

        assert_eq!(names, vec!["Ada Lovelace", "Battle of Hastings"]);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut repo = MockInfluencerRepo::new();
        repo.expect_all_ordered_by_name()
            .returning(|| Err(anyhow::anyhow!("database is locked")));

        let err = ListAvailableInfluencers::new(Arc::new(repo)).call().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
