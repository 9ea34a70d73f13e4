/**
 * Correlation Middleware
 *
 * Clients that want to correlate an HTTP request with the push updates it
 * triggers send an opaque token in the `ActionIdentifier` header. This
 * middleware captures that token once per request (absent header means an
 * empty token) and stores it in the request extensions, where the `ActionId`
 * extractor retrieves it for handlers.
 *
 * The token is request-scoped only: set at request entry, read by handlers
 * while building envelopes, and discarded with the request. It is never
 * persisted.
 */

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};

/// Header carrying the caller-supplied correlation token.
pub const ACTION_ID_HEADER: &str = "ActionIdentifier";

/// The correlation token of the current request.
///
/// Every envelope dispatched while handling the request carries this value
/// as its `action_id`. Empty when the caller sent no header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionId(pub String);

/// Capture the correlation header into request extensions.
///
/// Runs on every route so handlers can rely on the value being present.
pub async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    let action_id = request
        .headers()
        .get(ACTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    request.extensions_mut().insert(ActionId(action_id));
    next.run(request).await
}

impl<S> FromRequestParts<S> for ActionId
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Missing here means the middleware never ran for this route, which
        // is a wiring bug, not a client error. Fail loudly rather than
        // dispatching updates with a silently defaulted correlation id.
        parts.extensions.get::<ActionId>().cloned().ok_or_else(|| {
            tracing::error!("ActionId requested but correlation middleware did not run");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_action_id(action_id: ActionId) -> String {
        action_id.0
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", get(echo_action_id))
            .layer(axum::middleware::from_fn(correlation_middleware))
    }

    #[tokio::test]
    async fn header_value_reaches_the_handler() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/echo")
                    .header(ACTION_ID_HEADER, "abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc123");
    }

    #[tokio::test]
    async fn missing_header_becomes_empty_token() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn extraction_without_middleware_fails_loudly() {
        let bare = Router::new().route("/echo", get(echo_action_id));
        let response = bare
            .oneshot(
                HttpRequest::builder()
                    .uri("/echo")
                    .header(ACTION_ID_HEADER, "abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
