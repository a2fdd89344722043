use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, Object, Result, SimpleObject};
use chrono::NaiveDate;

use pf_core::models::{AvailableYear, Influencer, Location, Moment};
use pf_core::traits::Repositories;

use super::loaders::LocationsByMomentLoader;

#[derive(SimpleObject)]
#[graphql(name = "AvailableYear")]
pub struct GqlAvailableYear {
    pub year: i32,
    /// e.g. "1500 AD", "44 BC"
    pub formatted: String,
}

impl From<AvailableYear> for GqlAvailableYear {
    fn from(y: AvailableYear) -> Self {
        Self {
            year: y.year,
            formatted: y.formatted,
        }
    }
}

/// An influencer: a person or an event.
pub struct GqlInfluencer(pub Influencer);

#[Object(name = "Influencer", rename_fields = "snake_case")]
impl GqlInfluencer {
    async fn id(&self) -> i64 {
        self.0.id()
    }

    async fn name(&self) -> &str {
        self.0.name()
    }

    /// Always null for events.
    async fn gender(&self) -> Option<&str> {
        self.0.gender()
    }

    /// `Person` or `Event`.
    async fn kind(&self) -> &'static str {
        self.0.kind().as_str()
    }

    async fn earliest_date(&self) -> Option<NaiveDate> {
        self.0.earliest_date()
    }

    async fn moments(&self, ctx: &Context<'_>) -> Result<Vec<GqlMoment>> {
        let repos = ctx.data_unchecked::<Repositories>();
        let moments = repos.moments.search_by_influencer(self.0.key()).await?;
        Ok(moments.into_iter().map(GqlMoment).collect())
    }
}

/// A moment in history.
pub struct GqlMoment(pub Moment);

#[Object(name = "Moment", rename_fields = "snake_case")]
impl GqlMoment {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn year_begin(&self) -> i32 {
        self.0.year_begin()
    }

    async fn year_end(&self) -> Option<i32> {
        self.0.year_end()
    }

    async fn date_begin(&self) -> NaiveDate {
        self.0.date_begin
    }

    async fn date_end(&self) -> Option<NaiveDate> {
        self.0.date_end
    }

    async fn locations(&self, ctx: &Context<'_>) -> Result<Vec<GqlLocation>> {
        let loader = ctx.data_unchecked::<DataLoader<LocationsByMomentLoader>>();
        let locations = loader.load_one(self.0.id).await?.unwrap_or_default();
        Ok(locations.into_iter().map(GqlLocation).collect())
    }

    async fn influencer(&self, ctx: &Context<'_>) -> Result<Option<GqlInfluencer>> {
        let repos = ctx.data_unchecked::<Repositories>();
        let influencer = repos.influencers.find_influencer(self.0.influencer).await?;
        Ok(influencer.map(GqlInfluencer))
    }
}

pub struct GqlLocation(pub Location);

#[Object(name = "Location", rename_fields = "snake_case")]
impl GqlLocation {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn address(&self) -> &str {
        &self.0.address
    }

    /// `"<lat>,<lng>"`, null when the address was empty.
    async fn latlng(&self) -> Option<String> {
        self.0.latlng.map(|l| l.to_string())
    }

    async fn lat(&self) -> Option<f64> {
        self.0.latlng.map(|l| l.lat)
    }

    async fn lng(&self) -> Option<f64> {
        self.0.latlng.map(|l| l.lng)
    }
}
