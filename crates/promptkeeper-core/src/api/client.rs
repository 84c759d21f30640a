//! API client for the prompt service.
//!
//! This module provides the `ApiClient` struct for authenticating against
//! the `auth/local` endpoints and for the prompt CRUD endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{AuthUser, Prompt, PromptId, PromptListResponse, PromptRequest, PromptResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Timeouts surface to callers as ordinary network failures.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response from `auth/local` and `auth/local/register`.
///
/// A rejected login may still come back shaped like a success, just without
/// `jwt`, so both fields are optional and the caller decides.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub jwt: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// API client for the prompt service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:1337/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a single prompt, with the id percent-encoded as one path segment
    fn prompt_url(&self, id: &PromptId) -> Result<String> {
        if matches!(id.as_str(), "" | "." | "..") {
            anyhow::bail!("Invalid prompt id '{}'", id);
        }
        let mut url = Url::parse(&self.base_url).context("Invalid API base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot have a path"))?
            .pop_if_empty()
            .push("prompts")
            .push(id.as_str());
        Ok(url.into())
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Token is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        debug!(%method, url, "Sending request");
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        Self::check_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.send(method, url, body).await?;
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Password login. Returns whatever the server sent; a missing `jwt` is the
    /// caller's failure case.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest { identifier, password };
        self.send_json(Method::POST, &self.url("auth/local"), Some(&body))
            .await
            .context("Login request failed")
    }

    /// Account registration. Same response shape as `login`.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = RegisterRequest { username, email, password };
        self.send_json(Method::POST, &self.url("auth/local/register"), Some(&body))
            .await
            .context("Registration request failed")
    }

    // ===== Prompts =====

    /// Fetch every prompt visible to the current token, in server order
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let response: PromptListResponse = self
            .send_json(Method::GET, &self.url("prompts"), None::<&()>)
            .await
            .context("Failed to fetch prompts")?;
        debug!(count = response.data.len(), "Prompts fetched");
        Ok(response.data.into_iter().map(Prompt::from).collect())
    }

    pub async fn create_prompt(&self, name: &str, text: &str) -> Result<Prompt> {
        let body = PromptRequest::new(name, text);
        let response: PromptResponse = self
            .send_json(Method::POST, &self.url("prompts"), Some(&body))
            .await
            .context("Failed to create prompt")?;
        Ok(response.data.into())
    }

    pub async fn update_prompt(&self, id: &PromptId, name: &str, text: &str) -> Result<Prompt> {
        let body = PromptRequest::new(name, text);
        let url = self.prompt_url(id)?;
        let response: PromptResponse = self
            .send_json(Method::PUT, &url, Some(&body))
            .await
            .with_context(|| format!("Failed to update prompt {}", id))?;
        Ok(response.data.into())
    }

    /// Delete a prompt. The response body, if any, is ignored.
    pub async fn delete_prompt(&self, id: &PromptId) -> Result<()> {
        let url = self.prompt_url(id)?;
        self.send(Method::DELETE, &url, None::<&()>)
            .await
            .with_context(|| format!("Failed to delete prompt {}", id))?;
        Ok(())
    }
}

/// Ensure the base URL ends with exactly one `/` so relative paths join cleanly
fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}
