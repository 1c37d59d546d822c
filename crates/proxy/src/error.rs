//! Error taxonomy for the request pipeline
//!
//! One variant per failure class, each mapping to exactly one HTTP
//! response at the orchestration boundary. Nothing here is fatal to the
//! process; every request is handled in isolation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response;

/// Errors a request can surface while being proxied.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The endpoint selector query parameter is absent or empty.
    #[error("Missing endpoint")]
    MissingEndpoint,

    /// Every configured RPC endpoint failed to produce a usable domain.
    #[error("Could not fetch target domain")]
    DomainUnavailable,

    /// The forwarded request to the resolved domain failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingEndpoint => {
                response::plain_text(StatusCode::BAD_REQUEST, self.to_string())
            }
            other => {
                response::plain_text(StatusCode::INTERNAL_SERVER_ERROR, format!("error: {other}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_endpoint_maps_to_400() {
        let response = ProxyError::MissingEndpoint.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Missing endpoint");
    }

    #[tokio::test]
    async fn test_domain_unavailable_maps_to_500_with_prefix() {
        let response = ProxyError::DomainUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "error: Could not fetch target domain");
    }

    #[tokio::test]
    async fn test_upstream_error_maps_to_500_with_prefix() {
        // Port 0 is never connectable, giving a real client error.
        let source = reqwest::Client::new()
            .get("http://127.0.0.1:0/")
            .send()
            .await
            .expect_err("request to port 0 must fail");
        let response = ProxyError::from(source).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.starts_with("error: upstream request failed"));
    }
}
