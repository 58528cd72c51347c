//! Boundary to the upstream guest-login endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info, instrument, warn};

use super::errors::{ClientError, ClientResult};
use super::types::{GuestIdentity, SessionGrant};

/// Acquires guest sessions from the upstream.
///
/// Calling it again while a session exists may rotate the credential; the
/// caller only updates local state after a successful return.
#[async_trait(?Send)]
pub trait AuthGateway {
    async fn acquire_guest_session(&self, identity: &GuestIdentity) -> ClientResult<SessionGrant>;
}

/// Guest login over HTTP.
///
/// The session token comes back as an HttpOnly cookie that the browser keeps
/// on its own; the only thing read from the response is the optional
/// duration hint header.
#[derive(Clone)]
pub struct HttpAuthGateway {
    http_client: Client,
    endpoint: String,
    duration_header: String,
}

impl HttpAuthGateway {
    pub fn new(endpoint: impl Into<String>, duration_header: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint, duration_header)
    }

    pub fn with_client(
        http_client: Client,
        endpoint: impl Into<String>,
        duration_header: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            duration_header: duration_header.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl AuthGateway for HttpAuthGateway {
    #[instrument(skip(self), err)]
    async fn acquire_guest_session(&self, identity: &GuestIdentity) -> ClientResult<SessionGrant> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(identity)
            .send()
            .await
            .map_err(|e| {
                error!("Guest login request failed: {}", e);
                ClientError::NetworkError {
                    message: format!("Failed to reach auth endpoint: {}", e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Guest login rejected with HTTP {}: {}", status.as_u16(), message);
            return Err(ClientError::UpstreamRejected {
                status: status.as_u16(),
                message,
            });
        }

        let hint = response
            .headers()
            .get(self.duration_header.as_str())
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| match parse_duration_hint(raw) {
                Ok(ms) => Some(ms),
                Err(e) => {
                    warn!("Ignoring session duration hint: {}", e);
                    None
                }
            });

        info!("Guest session acquired for {}", identity.username);
        Ok(SessionGrant {
            session_duration_ms: hint,
        })
    }
}

/// Parse a duration hint header value as a number of milliseconds.
///
/// Only rejects text that is not a number at all; range checks happen when
/// the grant is applied.
pub fn parse_duration_hint(raw: &str) -> ClientResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ClientError::MalformedHint {
            value: raw.to_string(),
        })
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod http_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_PATH: &str = "/api/auth/guest-login";
    const HINT_HEADER: &str = "x-session-duration";

    fn gateway(server: &MockServer) -> HttpAuthGateway {
        HttpAuthGateway::new(format!("{}{}", server.uri(), LOGIN_PATH), HINT_HEADER)
    }

    async fn login_responds_with(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn posts_identity_and_reads_duration_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "username": "guest-7" })))
            .respond_with(ResponseTemplate::new(200).insert_header(HINT_HEADER, "1800000"))
            .expect(1)
            .mount(&server)
            .await;

        let grant = gateway(&server)
            .acquire_guest_session(&GuestIdentity::new("guest-7"))
            .await
            .unwrap();

        assert_eq!(grant.session_duration_ms, Some(1_800_000.0));
        assert_eq!(grant.valid_duration_ms(), Some(1_800_000));
    }

    #[tokio::test]
    async fn success_without_hint_has_no_duration() {
        let server = MockServer::start().await;
        login_responds_with(&server, ResponseTemplate::new(204)).await;

        let grant = gateway(&server)
            .acquire_guest_session(&GuestIdentity::new("guest"))
            .await
            .unwrap();

        assert_eq!(grant, SessionGrant::default());
    }

    #[tokio::test]
    async fn malformed_hint_is_dropped_but_login_succeeds() {
        let server = MockServer::start().await;
        login_responds_with(
            &server,
            ResponseTemplate::new(200).insert_header(HINT_HEADER, "half an hour"),
        )
        .await;

        let grant = gateway(&server)
            .acquire_guest_session(&GuestIdentity::new("guest"))
            .await
            .unwrap();

        assert_eq!(grant.session_duration_ms, None);
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_rejection() {
        let server = MockServer::start().await;
        login_responds_with(
            &server,
            ResponseTemplate::new(403).set_body_string("guest login disabled"),
        )
        .await;

        let result = gateway(&server)
            .acquire_guest_session(&GuestIdentity::new("guest"))
            .await;

        assert_eq!(
            result,
            Err(ClientError::UpstreamRejected {
                status: 403,
                message: "guest login disabled".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // bind then release a port so nothing is listening on it
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let gateway = HttpAuthGateway::new(
            format!("http://127.0.0.1:{}{}", port, LOGIN_PATH),
            HINT_HEADER,
        );

        let result = gateway
            .acquire_guest_session(&GuestIdentity::new("guest"))
            .await;

        assert!(matches!(result, Err(ClientError::NetworkError { .. })));
        assert!(result.unwrap_err().is_retryable());
    }
}
