/**
 * Push Transport
 *
 * This module defines the outbound push primitive the dispatcher sends
 * through: one flat string mapping delivered to one opaque device token, at
 * most one attempt per call.
 *
 * Two implementations are provided:
 *
 * - `HttpPushTransport` - POSTs the payload to a configured push gateway.
 * - `DisabledPushTransport` - used when no gateway is configured; drops the
 *   payload with a debug log so the rest of the server keeps working.
 *
 * Timeouts, retries, and delivery guarantees are the gateway's problem. The
 * dispatcher treats any failure here like any other send failure: log and
 * continue.
 */

use async_trait::async_trait;
use thiserror::Error;

use crate::dispatch::wire::WireData;

/// Errors from a single push attempt.
#[derive(Debug, Error)]
pub enum PushError {
    /// The outbound HTTP request itself failed (connect, timeout, TLS).
    #[error("push gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("push gateway rejected the message: status {0}")]
    Rejected(u16),
}

/// Send-by-token primitive used by the dispatcher.
///
/// Implementations must be at-most-one-attempt: no internal retries, no
/// queueing. Each call is independent.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, device_token: &str, data: WireData) -> Result<(), PushError>;
}

/// HTTP push transport posting to a gateway endpoint.
///
/// The request body is `{ "to": <token>, "data": { ... } }`, mirroring the
/// classic FCM-style data message. An optional API key is sent as a bearer
/// token.
pub struct HttpPushTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPushTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, device_token: &str, data: WireData) -> Result<(), PushError> {
        let body = serde_json::json!({
            "to": device_token,
            "data": data,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Rejected(status.as_u16()));
        }

        tracing::debug!("Push delivered to token ending {}", token_suffix(device_token));
        Ok(())
    }
}

/// No-op transport used when no push gateway is configured.
pub struct DisabledPushTransport;

#[async_trait]
impl PushTransport for DisabledPushTransport {
    async fn send(&self, device_token: &str, _data: WireData) -> Result<(), PushError> {
        tracing::debug!(
            "Push gateway not configured, dropping update for token ending {}",
            token_suffix(device_token)
        );
        Ok(())
    }
}

/// Last few characters of a token, for logging without leaking the token.
fn token_suffix(token: &str) -> &str {
    let start = token.len().saturating_sub(6);
    token.get(start..).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_data() -> WireData {
        let mut data = WireData::new();
        data.insert("ActionId".to_string(), "abc".to_string());
        data.insert("ActionType".to_string(), "ChatCreated".to_string());
        data
    }

    #[tokio::test]
    async fn http_transport_posts_token_and_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(serde_json::json!({
                "to": "device-1",
                "data": { "ActionId": "abc" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpPushTransport::new(format!("{}/send", server.uri()), None);
        let result = transport.send("device-1", sample_data()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn http_transport_surfaces_gateway_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpPushTransport::new(format!("{}/send", server.uri()), None);
        let error = transport.send("device-1", sample_data()).await.unwrap_err();
        match error {
            PushError::Rejected(status) => assert_eq!(status, 503),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_transport_accepts_everything() {
        let transport = DisabledPushTransport;
        assert!(transport.send("anything", sample_data()).await.is_ok());
    }

    #[test]
    fn token_suffix_handles_short_tokens() {
        assert_eq!(token_suffix("abc"), "abc");
        assert_eq!(token_suffix("0123456789"), "456789");
    }
}
