//! Bearer token session for Jamf Pro
//!
//! Tokens come from one of two grants: OAuth client credentials
//! (`/api/oauth/token`, with `/oauth/token` as the legacy path) or the
//! Basic-auth password grant (`/api/v1/auth/token`). The fallback chain is an
//! explicit state machine driven by the status codes of each attempt.
//!
//! A single session is shared by every request. Refreshes are serialized
//! behind one async mutex, so concurrent callers that observe an expired
//! token wait for the in-flight refresh and reuse its result. A refresh that
//! ends in rejection is remembered: later callers get the same error without
//! another credential exchange.

use chrono::{Duration, Utc};
use log::debug;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;

use super::models::BearerToken;
use crate::error::{ApiError, Result};

/// Lifetime assumed for password-grant tokens
const PASSWORD_TOKEN_LIFETIME_SECS: i64 = 14 * 60;

/// Lifetime assumed when the OAuth endpoint omits `expires_in`
const DEFAULT_OAUTH_EXPIRES_IN_SECS: i64 = 900;

/// Margin subtracted from server-declared OAuth lifetimes
const OAUTH_EXPIRY_MARGIN_SECS: i64 = 60;

/// Floor for OAuth token lifetimes after the margin is applied
const MIN_OAUTH_LIFETIME_SECS: i64 = 60;

/// Configured credential pairs. Either or both may be present.
#[derive(Clone, Default)]
pub struct Credentials {
    client: Option<(String, String)>,
    password: Option<(String, String)>,
}

impl Credentials {
    pub fn new(client: Option<(String, String)>, password: Option<(String, String)>) -> Self {
        Self { client, password }
    }

    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.password.is_none()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client.as_ref().map(|(id, _)| id))
            .field("user", &self.password.as_ref().map(|(user, _)| user))
            .finish()
    }
}

/// Grant that produced the current token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ClientCredentials,
    UserPassFallback,
    UserPass,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::ClientCredentials => write!(f, "client_credentials"),
            AuthMethod::UserPassFallback => write!(f, "userpass_fallback"),
            AuthMethod::UserPass => write!(f, "userpass"),
        }
    }
}

/// Progress through one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Unauthenticated,
    OAuthAttempted,
    PasswordAttempted,
    Authenticated(AuthMethod),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    ClientCredentials,
    Password,
}

/// Why a refresh cycle ended without a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    NoCredentials,
    Rejected,
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::NoCredentials => ApiError::NoCredentials,
            Failure::Rejected => ApiError::Unauthorized,
        }
    }
}

/// What the state machine wants to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Attempt(Grant),
    Done(AuthMethod),
    Fail(Failure),
}

impl AuthState {
    fn next_step(self, creds: &Credentials) -> Step {
        match self {
            AuthState::Unauthenticated if creds.client.is_some() => {
                Step::Attempt(Grant::ClientCredentials)
            }
            AuthState::Unauthenticated if creds.password.is_some() => {
                Step::Attempt(Grant::Password)
            }
            AuthState::Unauthenticated => Step::Fail(Failure::NoCredentials),
            AuthState::OAuthAttempted if creds.password.is_some() => {
                Step::Attempt(Grant::Password)
            }
            AuthState::OAuthAttempted | AuthState::PasswordAttempted => {
                Step::Fail(Failure::Rejected)
            }
            AuthState::Authenticated(method) => Step::Done(method),
        }
    }

    fn transition(self, grant: Grant, accepted: bool) -> AuthState {
        match (self, grant, accepted) {
            (_, Grant::ClientCredentials, true) => {
                AuthState::Authenticated(AuthMethod::ClientCredentials)
            }
            (_, Grant::ClientCredentials, false) => AuthState::OAuthAttempted,
            (AuthState::OAuthAttempted, Grant::Password, true) => {
                AuthState::Authenticated(AuthMethod::UserPassFallback)
            }
            (_, Grant::Password, true) => AuthState::Authenticated(AuthMethod::UserPass),
            (_, Grant::Password, false) => AuthState::PasswordAttempted,
        }
    }
}

/// Outcome of one pass through the grant chain
type Issued = std::result::Result<(BearerToken, AuthMethod), Failure>;

/// Mutable part of the session, guarded by one mutex
#[derive(Debug, Default)]
struct SessionState {
    token: Option<BearerToken>,
    method: Option<AuthMethod>,
    rejected: Option<Failure>,
}

/// Shared bearer-token session
pub struct AuthSession {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
    state: Mutex<SessionState>,
}

impl AuthSession {
    pub fn new(http: HttpClient, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Return a usable bearer token, refreshing it first if needed.
    pub async fn ensure_valid(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.token.as_ref().filter(|t| t.is_valid_at(Utc::now())) {
            return Ok(token.token.clone());
        }
        if let Some(failure) = state.rejected {
            return Err(ApiError::from(failure).into());
        }

        let (token, method) = match self.authenticate().await? {
            Ok(issued) => issued,
            Err(failure) => {
                debug!("[auth] refresh failed ({:?}), not retrying", failure);
                state.rejected = Some(failure);
                return Err(ApiError::from(failure).into());
            }
        };
        debug!("[auth] using method: {}", method);

        let value = token.token.clone();
        state.token = Some(token);
        state.method = Some(method);
        Ok(value)
    }

    /// Drop the current token if it is still the one a request was rejected with.
    ///
    /// A token refreshed by another caller in the meantime is left alone.
    pub async fn invalidate(&self, rejected: &str) {
        let mut state = self.state.lock().await;
        if state.token.as_ref().is_some_and(|t| t.token == rejected) {
            debug!("[auth] invalidating rejected token");
            state.token = None;
        }
    }

    /// Grant used for the most recent successful refresh
    pub async fn method(&self) -> Option<AuthMethod> {
        self.state.lock().await.method
    }

    /// Install a token obtained elsewhere
    #[cfg(test)]
    pub async fn set_token(&self, token: BearerToken) {
        self.state.lock().await.token = Some(token);
    }

    /// Walk the grant chain once. The outer error is a transport or protocol
    /// failure; the inner one means every configured credential was refused.
    async fn authenticate(&self) -> Result<Issued> {
        let mut state = AuthState::Unauthenticated;
        let mut issued: Option<BearerToken> = None;

        loop {
            match state.next_step(&self.credentials) {
                Step::Attempt(grant) => {
                    let token = match grant {
                        Grant::ClientCredentials => self.client_credentials_grant().await?,
                        Grant::Password => self.password_grant().await?,
                    };
                    state = state.transition(grant, token.is_some());
                    if token.is_some() {
                        issued = token;
                    } else {
                        debug!("[auth] {:?} grant rejected with 401", grant);
                    }
                }
                Step::Done(method) => {
                    return Ok(issued
                        .map(|token| (token, method))
                        .ok_or(Failure::Rejected));
                }
                Step::Fail(failure) => return Ok(Err(failure)),
            }
        }
    }

    /// Client-credentials grant. `Ok(None)` means the credential was rejected.
    async fn client_credentials_grant(&self) -> Result<Option<BearerToken>> {
        let Some((client_id, client_secret)) = &self.credentials.client else {
            return Ok(None);
        };

        let mut response = self
            .post_client_credentials("/api/oauth/token", client_id, client_secret)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("[auth] /api/oauth/token not found, trying legacy /oauth/token");
            response = self
                .post_client_credentials("/oauth/token", client_id, client_secret)
                .await?;
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let body = token_body(response).await?;
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.trim().parse().ok()))
            .unwrap_or(DEFAULT_OAUTH_EXPIRES_IN_SECS);
        let lifetime = (expires_in - OAUTH_EXPIRY_MARGIN_SECS).max(MIN_OAUTH_LIFETIME_SECS);

        Ok(Some(BearerToken {
            token: token_field(&body, &["access_token", "token"])?,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        }))
    }

    /// Basic-auth password grant. `Ok(None)` means the credential was rejected.
    async fn password_grant(&self) -> Result<Option<BearerToken>> {
        let Some((user, password)) = &self.credentials.password else {
            return Ok(None);
        };

        let url = format!("{}/api/v1/auth/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(user, Some(password))
            .send()
            .await
            .map_err(ApiError::from)?;
        debug!("[auth] POST {} -> {}", url, response.status());

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let body = token_body(response).await?;
        Ok(Some(BearerToken {
            token: token_field(&body, &["token", "access_token"])?,
            expires_at: Utc::now() + Duration::seconds(PASSWORD_TOKEN_LIFETIME_SECS),
        }))
    }

    async fn post_client_credentials(
        &self,
        path: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(ApiError::from)?;
        debug!("[auth] POST {} -> {}", url, response.status());
        Ok(response)
    }
}

/// Parse a token endpoint response, mapping non-success statuses to errors.
async fn token_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let err = if status.is_server_error() {
            ApiError::ServerError(format!("token endpoint returned {}: {}", status, text))
        } else {
            ApiError::BadRequest(format!("token endpoint returned {}: {}", status, text))
        };
        return Err(err.into());
    }

    response.json::<Value>().await.map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse token response: {}", e)).into()
    })
}

/// First non-empty string among `keys`
fn token_field(body: &Value, keys: &[&str]) -> Result<String> {
    keys.iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidResponse("token response has no token".to_string()).into())
}
