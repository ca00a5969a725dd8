//! REST API client module for the DrDrive backend.
//!
//! This module provides the `ApiClient` for signing in, registering,
//! updating the profile and requesting diagnoses.
//!
//! Authenticated endpoints use a bearer token obtained from `/login` or
//! `/register`.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthSuccess, ProfileUpdated};
pub use error::ApiError;
