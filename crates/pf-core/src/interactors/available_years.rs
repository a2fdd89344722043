use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{available_years, AvailableYear, InfluencerKey};
use crate::traits::MomentRepo;

/// Timeline years for all moments, or for one influencer's moments.
pub struct AvailableYears {
    moments: Arc<dyn MomentRepo>,
}

impl AvailableYears {
    pub fn new(moments: Arc<dyn MomentRepo>) -> Self {
        Self { moments }
    }

    pub async fn call(&self, influencer: Option<InfluencerKey>) -> Result<Vec<AvailableYear>> {
        let moments = match influencer {
            Some(key) => self.moments.search_by_influencer(key).await,
            None => self.moments.all_moments().await,
        }
        .map_err(AppError::Storage)?;

        Ok(available_years(&moments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InfluencerKind, Moment};
    use crate::traits::MockMomentRepo;
    use chrono::{NaiveDate, Utc};
    use mockall::predicate::eq;

    fn moment(owner: InfluencerKey, begin: i32, end: i32) -> Moment {
        Moment {
            id: 0,
            date_begin: NaiveDate::from_ymd_opt(begin, 3, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(end, 3, 1),
            influencer: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn filtered_call_only_reads_that_influencer() {
        let key = InfluencerKey::new(InfluencerKind::Person, 7);
        let mut repo = MockMomentRepo::new();
        repo.expect_all_moments().never();
        repo.expect_search_by_influencer()
            .with(eq(key))
            .returning(move |k| Ok(vec![moment(k, 2000, 2002), moment(k, 2003, 2004)]));

        let years = AvailableYears::new(Arc::new(repo)).call(Some(key)).await.unwrap();

        assert_eq!(years.len(), 5);
        assert_eq!(years.first().map(|y| y.year), Some(2000));
        assert_eq!(years.last().map(|y| y.year), Some(2004));
    }

    #[tokio::test]
    async fn unfiltered_call_reads_everything() {
        let mut repo = MockMomentRepo::new();
        repo.expect_all_moments().returning(|| Ok(Vec::new()));

        let years = AvailableYears::new(Arc::new(repo)).call(None).await.unwrap();
        assert!(years.is_empty());
    }
}
