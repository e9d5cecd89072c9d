//! Jamf Pro Classic API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde_json::Value;

use super::auth::{AuthSession, Credentials};
use super::{InventoryApi, ObjectKind};
use crate::error::{ApiError, Result};

const APPLICATION_XML: &str = "application/xml";

/// Connection settings for [`JamfClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Accept invalid TLS certificates
    pub insecure: bool,
    /// Client-side request throttle
    pub requests_per_second: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            insecure: false,
            requests_per_second: 20,
        }
    }
}

/// Jamf Pro API client
pub struct JamfClient {
    http: HttpClient,
    base_url: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    auth: AuthSession,
}

impl JamfClient {
    /// Create a new client for `base_url` (no trailing slash)
    pub fn new(base_url: &str, credentials: Credentials, options: &ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(options.insecure)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(options.requests_per_second).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            auth: AuthSession::new(http.clone(), base_url, credentials),
            http,
            base_url: base_url.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Shared token session
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    fn object_url(&self, kind: ObjectKind, id: i64) -> String {
        format!(
            "{}/JSSResource/{}/id/{}",
            self.base_url,
            kind.resource_path(),
            id
        )
    }

    /// Send an authenticated request, refreshing the token and retrying once on 401.
    async fn execute<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        self.rate_limiter.until_ready().await;
        let token = self.auth.ensure_valid().await?;
        let response = build()
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::from)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!("401 from {}, refreshing token and retrying", response.url());
        self.auth.invalidate(&token).await;

        self.rate_limiter.until_ready().await;
        let token = self.auth.ensure_valid().await?;
        let response = build()
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::from)?;

        check_status(response).await
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.execute(|| self.http.get(url)).await?;
        let data = response.json::<Value>().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;
        Ok(data)
    }
}

/// Map a response status to the API error taxonomy.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    match status {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized.into()),
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden.into()),
        StatusCode::NOT_FOUND => {
            let url = response.url().path().to_string();
            Err(ApiError::NotFound(url).into())
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Bad request".to_string());
            Err(ApiError::BadRequest(error_msg).into())
        }
        status if status.is_server_error() => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("Server error: {}", status));
            Err(ApiError::ServerError(error_msg).into())
        }
        _ => {
            let error_msg = format!("Unexpected status code: {}", status);
            Err(ApiError::InvalidResponse(error_msg).into())
        }
    }
}

#[async_trait]
impl InventoryApi for JamfClient {
    async fn list_raw(&self, kind: ObjectKind) -> Result<Value> {
        let url = format!("{}/JSSResource/{}", self.base_url, kind.resource_path());
        self.get_json(&url).await
    }

    async fn get_detail(&self, kind: ObjectKind, id: i64) -> Result<Value> {
        self.get_json(&self.object_url(kind, id)).await
    }

    async fn get_scope_xml(&self, kind: ObjectKind, id: i64) -> Result<String> {
        let url = format!("{}/subset/Scope", self.object_url(kind, id));
        let response = self
            .execute(|| self.http.get(&url).header(ACCEPT, APPLICATION_XML))
            .await?;

        response.text().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to read scope XML: {}", e)).into()
        })
    }

    async fn put_xml(&self, kind: ObjectKind, id: i64, body: &str) -> Result<()> {
        let url = self.object_url(kind, id);
        self.execute(|| {
            self.http
                .put(&url)
                .header(ACCEPT, APPLICATION_XML)
                .header(CONTENT_TYPE, APPLICATION_XML)
                .body(body.to_string())
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::BearerToken;
    use crate::error::Error;
    use chrono::Utc;
    use mockito::Matcher;

    fn client(url: &str) -> JamfClient {
        let creds = Credentials::new(Some(("cid".to_string(), "secret".to_string())), None);
        JamfClient::new(url, creds, &ClientOptions::default()).unwrap()
    }

    async fn seed_token(client: &JamfClient, token: &str) {
        client
            .auth()
            .set_token(BearerToken {
                token: token.to_string(),
                expires_at: Utc::now() + chrono::Duration::minutes(10),
            })
            .await;
    }

    #[test]
    fn test_client_creation() {
        let creds = Credentials::new(None, Some(("u".to_string(), "p".to_string())));
        assert!(JamfClient::new("https://jamf.example.com", creds, &ClientOptions::default()).is_ok());
    }

    #[tokio::test]
    async fn test_list_attaches_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/JSSResource/scripts")
            .match_header("authorization", "Bearer live")
            .with_status(200)
            .with_body(r#"{"scripts":[{"id":1,"name":"a"}]}"#)
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "live").await;

        let data = client.list_raw(ObjectKind::Script).await.unwrap();
        assert_eq!(data["scripts"][0]["id"], 1);
        listing.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once() {
        let mut server = mockito::Server::new_async().await;
        let stale = server
            .mock("GET", "/JSSResource/policies/id/7")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let token = server
            .mock("POST", "/api/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","expires_in":1800}"#)
            .expect(1)
            .create_async()
            .await;
        let fresh = server
            .mock("GET", "/JSSResource/policies/id/7")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"policy":{"general":{"id":7}}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "stale").await;

        let detail = client.get_detail(ObjectKind::Policy, 7).await.unwrap();
        assert_eq!(detail["policy"]["general"]["id"], 7);

        stale.assert_async().await;
        token.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_401_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _denied = server
            .mock("GET", "/JSSResource/policies/id/7")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let token = server
            .mock("POST", "/api/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "stale").await;

        let err = client.get_detail(ObjectKind::Policy, 7).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
        assert!(err.is_fatal());
        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_scope_requests_xml() {
        let mut server = mockito::Server::new_async().await;
        let scope = server
            .mock("GET", "/JSSResource/osxconfigurationprofiles/id/3/subset/Scope")
            .match_header("accept", "application/xml")
            .with_status(200)
            .with_body("<os_x_configuration_profile><scope><all_computers>true</all_computers></scope></os_x_configuration_profile>")
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "live").await;

        let xml = client.get_scope_xml(ObjectKind::Profile, 3).await.unwrap();
        assert!(xml.contains("<all_computers>true</all_computers>"));
        scope.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_sends_xml_body() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/JSSResource/packages/id/9")
            .match_header("content-type", "application/xml")
            .match_body(Matcher::Exact(
                "<package><category><name>z_Archive</name></category></package>".to_string(),
            ))
            .with_status(201)
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "live").await;

        client
            .put_xml(
                ObjectKind::Package,
                9,
                "<package><category><name>z_Archive</name></category></package>",
            )
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_not_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _broken = server
            .mock("GET", "/JSSResource/policies/id/5")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client(&server.url());
        seed_token(&client, "live").await;

        let err = client.get_detail(ObjectKind::Policy, 5).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::ServerError(ref m)) if m == "boom"));
        assert!(!err.is_fatal());
    }
}
