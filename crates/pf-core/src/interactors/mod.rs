//! # Interactors
//!
//! Use-case objects. Each one receives its collaborators explicitly and
//! exposes a single `call`.

pub mod available_years;
pub mod create_influencer;
pub mod create_moment;
pub mod list_available_influencers;

pub use available_years::AvailableYears;
pub use create_influencer::CreateInfluencer;
pub use create_moment::{
    CreateMoment, CreateMomentInput, InfluencerParams, LocationParams, MomentParams,
};
pub use list_available_influencers::ListAvailableInfluencers;
