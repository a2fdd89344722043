use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::Html;

use pf_core::interactors::{AvailableYears, ListAvailableInfluencers};
use pf_core::models::InfluencerKey;
use pf_core::traits::Repositories;

use super::loaders::LocationsByMomentLoader;
use super::types::*;
use crate::AppState;

/// Read-only: curation goes through the admin endpoints.
pub type PinfluenceSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub struct QueryRoot;

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl QueryRoot {
    /// Every year spanned by the moments, optionally of one influencer.
    async fn available_years(
        &self,
        ctx: &Context<'_>,
        influencer_id: Option<i64>,
        influencer_type: Option<String>,
    ) -> Result<Vec<GqlAvailableYear>> {
        let filter = InfluencerKey::from_filter(influencer_id, influencer_type.as_deref())?;
        let years = ctx.data_unchecked::<AvailableYears>().call(filter).await?;
        Ok(years.into_iter().map(GqlAvailableYear::from).collect())
    }

    /// All people and events, ordered by name.
    async fn influencers(&self, ctx: &Context<'_>) -> Result<Vec<GqlInfluencer>> {
        let influencers = ctx.data_unchecked::<ListAvailableInfluencers>().call().await?;
        Ok(influencers.into_iter().map(GqlInfluencer).collect())
    }

    async fn influencer(
        &self,
        ctx: &Context<'_>,
        id: i64,
        #[graphql(name = "type")] kind: String,
    ) -> Result<Option<GqlInfluencer>> {
        let key = InfluencerKey::new(kind.parse()?, id);
        let repos = ctx.data_unchecked::<Repositories>();
        Ok(repos.influencers.find_influencer(key).await?.map(GqlInfluencer))
    }

    /// Moments oldest first, optionally of one influencer.
    async fn moments(
        &self,
        ctx: &Context<'_>,
        influencer_id: Option<i64>,
        influencer_type: Option<String>,
    ) -> Result<Vec<GqlMoment>> {
        let repos = ctx.data_unchecked::<Repositories>();
        let moments = match InfluencerKey::from_filter(influencer_id, influencer_type.as_deref())? {
            Some(key) => repos.moments.search_by_influencer(key).await?,
            None => repos.moments.all_moments().await?,
        };
        Ok(moments.into_iter().map(GqlMoment).collect())
    }

    async fn moment(&self, ctx: &Context<'_>, id: i64) -> Result<Option<GqlMoment>> {
        let repos = ctx.data_unchecked::<Repositories>();
        Ok(repos.moments.find_moment(id).await?.map(GqlMoment))
    }
}

pub fn build_schema(repos: Repositories) -> PinfluenceSchema {
    let locations_loader = DataLoader::new(
        LocationsByMomentLoader {
            locations: repos.locations.clone(),
        },
        tokio::spawn,
    );

    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(AvailableYears::new(repos.moments.clone()))
        .data(ListAvailableInfluencers::new(repos.influencers.clone()))
        .data(locations_loader)
        .data(repos)
        .finish()
}

pub async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

pub async fn graphiql() -> Html<String> {
    Html(async_graphql::http::GraphiQLSource::build().endpoint("/api").finish())
}
