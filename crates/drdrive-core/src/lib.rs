//! Core library for DrDrive, the vehicle diagnostics assistant.
//!
//! This crate holds everything that is not presentation:
//!
//! - `api`: REST client for the DrDrive backend
//! - `auth`: the session lifecycle (restore, sign in, sign up, sign out)
//! - `storage`: durable key-value stores the session persists into
//! - `config`: on-disk configuration
//! - `models`: wire and domain types
//! - `validation`: form checks used by front-ends before calling `auth`

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionError, SessionManager, SessionState};
pub use config::Config;
pub use storage::KeyValueStore;
