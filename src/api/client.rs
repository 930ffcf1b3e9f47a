//! HTTP client for the Employee-Directory auth endpoints.
//!
//! `AuthClient` speaks to the two authentication operations (`/api/register`
//! and `/api/login`) and the health probe. It returns typed results; the
//! session manager converts them to booleans at its boundary.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Successful login response body.
///
/// `expires_in` is the grant validity in seconds. The server normally sends
/// it, but it is untrusted input: the session manager substitutes a default
/// when it is absent. A missing `access_token` fails deserialization, which
/// is exactly the contract-violation handling wanted for that field.
#[derive(Debug, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// API client for the auth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new client for the service at `base_url` (no trailing slash).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying pooled HTTP client, shared with the request wrapper.
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for an API path like `/api/employees`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create an account. Acceptance criteria (username uniqueness and the
    /// like) belong to the server; a 409 comes back as `ApiError::Conflict`.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("/api/register"))
            .json(&CredentialsBody { username, password })
            .send()
            .await?;

        Self::check_response(response).await?;
        debug!(username, "registration accepted");
        Ok(())
    }

    /// Authenticate and return the issued grant. Rejected credentials come
    /// back as `ApiError::Unauthorized`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/api/login"))
            .json(&CredentialsBody { username, password })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let grant: LoginGrant = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad login body: {}", e)))?;
        Ok(grant)
    }

    /// Probe `/api/healthz`; true when the service answers `{"status":"ok"}`.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let response = self.client.get(self.endpoint("/api/healthz")).send().await?;
        let response = Self::check_response(response).await?;
        let body: HealthBody = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad health body: {}", e)))?;
        Ok(body.status == "ok")
    }

    /// Check if response is successful, returning an error with body if not.
    pub(crate) async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = AuthClient::new("http://localhost:5000/").expect("client");
        assert_eq!(
            client.endpoint("/api/login"),
            "http://localhost:5000/api/login"
        );
    }

    #[test]
    fn test_login_grant_parses_full_body() {
        let grant: LoginGrant =
            serde_json::from_str(r#"{"access_token": "tok123", "expires_in": 3600}"#)
                .expect("parse");
        assert_eq!(grant.access_token, "tok123");
        assert_eq!(grant.expires_in, Some(3600));
    }

    #[test]
    fn test_login_grant_tolerates_missing_expiry() {
        let grant: LoginGrant =
            serde_json::from_str(r#"{"access_token": "tok123"}"#).expect("parse");
        assert_eq!(grant.expires_in, None);
    }

    #[test]
    fn test_login_grant_requires_access_token() {
        let result: Result<LoginGrant, _> = serde_json::from_str(r#"{"expires_in": 3600}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_register_conflict_surfaces_as_conflict() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/register")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"msg": "User already exists"}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url()).expect("client");
        let err = client.register("alice", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_sends_json_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/login")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "username": "alice",
                "password": "correct"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok123", "expires_in": 3600}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url()).expect("client");
        let grant = client.login("alice", "correct").await.expect("login");
        assert_eq!(grant.access_token, "tok123");
        mock.assert_async().await;
    }
}
