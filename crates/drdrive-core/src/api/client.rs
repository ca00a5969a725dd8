//! API client for the DrDrive backend.
//!
//! This module provides the `ApiClient` struct for the credential endpoints
//! (`/login`, `/register`) and the bearer-authenticated ones (`/profile`,
//! `/generate`).

use std::time::Duration;

use chrono::Utc;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Diagnosis, DiagnosisRequest, ProfileUpdate, RegisterRequest, User};

use super::ApiError;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Shared shape of `/login` and `/register` responses
#[derive(Debug, Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    token: Option<String>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    prompt: Option<String>,
    response: Option<String>,
}

/// Token and user issued by a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSuccess {
    pub token: String,
    pub user: User,
}

/// Result of `PUT /profile`. The backend may rotate the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdated {
    pub token: Option<String>,
}

impl AuthEnvelope {
    fn into_success(self) -> Result<AuthSuccess, ApiError> {
        if !self.success {
            return Err(ApiError::Unsuccessful(self.error));
        }
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok(AuthSuccess { token, user }),
            _ => Err(ApiError::InvalidResponse(
                "success response is missing token or user".to_string(),
            )),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the DrDrive backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client against `base_url` (e.g. `https://host/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_base_url(), config.request_timeout())
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn bearer(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    /// Send a request and decode its JSON body.
    /// Non-2xx statuses become `ApiError::Rejected` carrying the backend's `error` field.
    async fn send<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                url = url,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&body),
                "Backend rejected request"
            );
            return Err(ApiError::from_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))
    }

    // ===== Credential endpoints =====

    /// Exchange username and password for a token and user
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        let url = self.url("login");
        debug!(url = %url, username = username, "Sending login request");

        let request = self.client.post(&url).json(&LoginRequest { username, password });
        let envelope: AuthEnvelope = Self::send(request, &url).await?;
        envelope.into_success()
    }

    /// Create an account; a successful registration also signs the user in
    pub async fn register(&self, body: &RegisterRequest) -> Result<AuthSuccess, ApiError> {
        let url = self.url("register");
        debug!(url = %url, username = %body.username, "Sending registration request");

        let request = self.client.post(&url).json(body);
        let envelope: AuthEnvelope = Self::send(request, &url).await?;
        envelope.into_success()
    }

    // ===== Authenticated endpoints =====

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileUpdated, ApiError> {
        let url = self.url("profile");
        debug!(url = %url, "Sending profile update");

        let request = self.bearer(self.client.put(&url).json(update))?;
        let envelope: ProfileEnvelope = Self::send(request, &url).await?;

        if !envelope.success {
            return Err(ApiError::Unsuccessful(envelope.error));
        }
        Ok(ProfileUpdated {
            token: envelope.token.filter(|t| !t.is_empty()),
        })
    }

    /// Ask the backend to diagnose a problem from a description and/or photo
    pub async fn generate(&self, request: &DiagnosisRequest) -> Result<Diagnosis, ApiError> {
        let url = self.url("generate");
        debug!(
            url = %url,
            has_image = request.image.is_some(),
            "Sending diagnosis request"
        );

        let mut form = multipart::Form::new().text("prompt", request.prompt.clone());
        if let Some(ref image) = request.image {
            let part = multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime_type)?;
            form = form.part("images", part);
        }

        let builder = self.bearer(self.client.post(&url).multipart(form))?;
        let envelope: GenerateEnvelope = Self::send(builder, &url).await?;

        if !envelope.success {
            return Err(ApiError::Unsuccessful(envelope.error));
        }
        let response = envelope.response.ok_or_else(|| {
            ApiError::InvalidResponse("diagnosis response is missing `response`".to_string())
        })?;

        Ok(Diagnosis {
            prompt: envelope.prompt.unwrap_or_else(|| request.prompt.clone()),
            response,
            received_at: Utc::now(),
        })
    }
}
