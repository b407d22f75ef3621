//! Cookie-carrying HTTP client for applications behind AuthHub.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use authhub_auth::jwt::Jwks;
use authhub_core::error::AppError;
use authhub_core::result::AppResult;

use crate::refresh::RefreshGuard;
use crate::verifier::fetch_jwks;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
    aud: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginReply {
    redirect: String,
}

/// HTTP client whose cookie jar holds the AuthHub token cookies.
///
/// A 401 on any request except the refresh itself triggers one refresh,
/// coalesced across concurrent callers, and one retry.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: Client,
    base_url: Url,
    guard: RefreshGuard,
}

impl SessionClient {
    /// Creates a client for the AuthHub server at `base_url`.
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::configuration(format!("Invalid AuthHub URL '{base_url}': {e}")))?;
        let http = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            guard: RefreshGuard::new(),
        })
    }

    /// Resolves `path` against the server URL.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::validation(format!("Invalid path '{path}': {e}")))
    }

    /// Logs in and returns the validated redirect target.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        audience: &str,
        redirect: Option<&str>,
    ) -> AppResult<String> {
        let response = self
            .http
            .post(self.url("/auth/login")?)
            .json(&LoginBody {
                email,
                password,
                aud: audience,
                redirect,
            })
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {
                let reply: LoginReply = response.json().await.map_err(transport)?;
                Ok(reply.redirect)
            }
            StatusCode::FORBIDDEN => Err(AppError::authorization("Audience not allowed")),
            StatusCode::TOO_MANY_REQUESTS => Err(AppError::rate_limit("Too many login attempts")),
            _ => Err(AppError::invalid_credentials()),
        }
    }

    /// Rotates the refresh cookie, sharing one call among concurrent callers.
    pub async fn refresh(&self) -> AppResult<()> {
        let http = self.http.clone();
        let url = self.url(REFRESH_PATH)?;
        self.guard
            .run(move || async move {
                let response = http.post(url).send().await.map_err(transport)?;
                if response.status().is_success() {
                    debug!("Session refreshed");
                    Ok(())
                } else {
                    warn!(status = %response.status(), "Session refresh rejected");
                    Err(AppError::unauthorized_session())
                }
            })
            .await
    }

    /// Logs out. The server clears the cookies whatever the outcome.
    pub async fn logout(&self) -> AppResult<()> {
        self.http
            .post(self.url("/auth/logout")?)
            .send()
            .await
            .map_err(transport)?;
        Ok(())
    }

    /// Sends the request built by `build`, refreshing and retrying once
    /// if it comes back 401.
    pub async fn execute<F>(&self, build: F) -> AppResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = build(&self.http).send().await.map_err(transport)?;
        if response.status() != StatusCode::UNAUTHORIZED || is_refresh(&response) {
            return Ok(response);
        }

        debug!(url = %response.url(), "Request unauthorized, refreshing once");
        self.refresh().await?;
        build(&self.http).send().await.map_err(transport)
    }

    /// `GET path` with refresh-and-retry.
    pub async fn get(&self, path: &str) -> AppResult<Response> {
        let url = self.url(path)?;
        self.execute(|http| http.get(url.clone())).await
    }

    /// Fetches the server's public key set.
    pub async fn jwks(&self) -> AppResult<Jwks> {
        fetch_jwks(&self.http, &self.base_url).await
    }
}

fn is_refresh(response: &Response) -> bool {
    response.url().path() == REFRESH_PATH
}

fn transport(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::service_unavailable(format!("AuthHub request timed out: {e}"))
    } else {
        AppError::external_service(format!("AuthHub request failed: {e}"))
    }
}
