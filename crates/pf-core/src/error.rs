//! # AppError
//!
//! Centralized error handling for Pinfluence.
//! Maps workflow failures and collaborator failures to actionable error types.

use thiserror::Error;

/// The primary error type for all pf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A non-empty address that the location service could not resolve.
    /// Aborts moment creation before anything is written.
    #[error("location address not found: '{0}'")]
    LocationAddressNotFound(String),

    /// Resource not found (e.g., Person, Event, Moment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., unparseable date, unknown influencer type)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Admin credentials missing or wrong
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Repository failure (constraint violation, connection loss)
    #[error("storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    /// Location service transport or decoding failure
    #[error("geocoder error: {0:#}")]
    Geocoder(#[source] anyhow::Error),

    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Pinfluence logic.
pub type Result<T> = std::result::Result<T, AppError>;
