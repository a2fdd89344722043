//! # pf-api
//!
//! The web routing and orchestration layer for Pinfluence: the public
//! GraphQL read API and the authenticated admin endpoints.

pub mod admin;
pub mod error;
pub mod graphql;
pub mod middleware;

use std::sync::Arc;

use axum::routing::{delete, get};
use axum::Router;
use pf_core::interactors::{CreateInfluencer, CreateMoment, ListAvailableInfluencers};
use pf_core::traits::{AuthProvider, InfluencerIndexer, LocationService, Repositories};

use graphql::{build_schema, PinfluenceSchema};

/// State shared across all request handlers.
pub struct AppState {
    pub schema: PinfluenceSchema,
    pub repos: Repositories,
    pub create_moment: CreateMoment,
    pub create_influencer: CreateInfluencer,
    pub list_influencers: ListAvailableInfluencers,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Wires interactors and the schema from explicitly injected collaborators.
    pub fn new(
        repos: Repositories,
        location_service: Arc<dyn LocationService>,
        indexer: Arc<dyn InfluencerIndexer>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            schema: build_schema(repos.clone()),
            create_moment: CreateMoment::new(
                repos.influencers.clone(),
                repos.moments.clone(),
                location_service,
                indexer.clone(),
            ),
            create_influencer: CreateInfluencer::new(repos.influencers.clone(), indexer),
            list_influencers: ListAvailableInfluencers::new(repos.influencers.clone()),
            repos,
            auth,
        }
    }
}

/// Configures the routes for the application.
///
/// # Developer Note
/// The admin routes are nested so the auth layer applies to them alone;
/// the GraphQL endpoint and the health check stay public.
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route(
            "/influencers",
            get(admin::list_influencers).post(admin::create_influencer),
        )
        .route("/moments", get(admin::list_moments).post(admin::create_moment))
        .route("/moments/{id}", delete(admin::delete_moment))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api", get(graphql::graphiql).post(graphql::graphql_handler))
        .nest("/admin", admin)
        .with_state(state)
        .layer(middleware::cors_policy())
        .layer(middleware::trace_layer())
}
