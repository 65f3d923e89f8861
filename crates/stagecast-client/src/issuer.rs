//! HTTP credential issuer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use stagecast_core::CredentialIssuer;
use stagecast_types::{Credential, CredentialError};
use url::Url;

use crate::error::ClientError;

#[derive(Debug, Serialize)]
struct IssueRequest<'a> {
    identity: &'a str,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    token: String,
    /// Lifetime in seconds
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Issues push credentials by `POST`ing the client identity to the issuer.
#[derive(Debug, Clone)]
pub struct HttpCredentialIssuer {
    client: Client,
    endpoint: Url,
}

impl HttpCredentialIssuer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|source| ClientError::InvalidUrl { url: endpoint.to_string(), source })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CredentialIssuer for HttpCredentialIssuer {
    async fn issue(&self, identity: &str) -> Result<Credential, CredentialError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&IssueRequest { identity })
            .send()
            .await
            .map_err(|e| CredentialError::Unreachable { message: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "[Refresh] Issuer refused: {}", message);
            return Err(if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                CredentialError::Unreachable { message: format!("issuer returned {}", status) }
            } else {
                CredentialError::Rejected { status: status.as_u16(), message }
            });
        }

        let body: IssueResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::InvalidResponse { message: e.to_string() })?;
        into_credential(body, identity)
    }
}

fn into_credential(body: IssueResponse, identity: &str) -> Result<Credential, CredentialError> {
    if body.token.is_empty() {
        return Err(CredentialError::InvalidResponse { message: "empty token".to_string() });
    }
    let expires_at = match (body.expires_at, body.expires_in) {
        (Some(at), _) => at,
        (None, Some(secs)) => Utc::now() + chrono::Duration::seconds(secs),
        (None, None) => {
            return Err(CredentialError::InvalidResponse {
                message: "response has neither expires_at nor expires_in".to_string(),
            })
        },
    };
    Ok(Credential::new(body.token, identity, expires_at))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn issuer_for(server: &MockServer) -> HttpCredentialIssuer {
        HttpCredentialIssuer::new(&format!("{}/token", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_issue_with_expires_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({"identity": "projector-1"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"token": "abc", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credential = issuer_for(&server).await.issue("projector-1").await.unwrap();
        assert_eq!(credential.token, "abc");
        assert_eq!(credential.identity, "projector-1");
        let lifetime = credential.lifetime_at(Utc::now());
        assert!(lifetime > chrono::Duration::minutes(59) && lifetime <= chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn test_issue_with_expires_at() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"token": "abc", "expires_at": "2099-01-01T00:00:00Z"}),
            ))
            .mount(&server)
            .await;

        let credential = issuer_for(&server).await.issue("projector-1").await.unwrap();
        assert_eq!(credential.expires_at.to_rfc3339(), "2099-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_forbidden_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("unknown identity"))
            .mount(&server)
            .await;

        let err = issuer_for(&server).await.issue("stranger").await.unwrap_err();
        assert_eq!(
            err,
            CredentialError::Rejected { status: 403, message: "unknown identity".to_string() }
        );
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = issuer_for(&server).await.issue("projector-1").await.unwrap_err();
        assert!(matches!(err, CredentialError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_bad_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .mount(&server)
            .await;

        let err = issuer_for(&server).await.issue("projector-1").await.unwrap_err();
        assert!(matches!(err, CredentialError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_issuer() {
        let issuer =
            HttpCredentialIssuer::new("http://127.0.0.1:9/token", Duration::from_secs(2)).unwrap();
        let err = issuer.issue("projector-1").await.unwrap_err();
        assert!(matches!(err, CredentialError::Unreachable { .. }));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = HttpCredentialIssuer::new("not a url", Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }
}
