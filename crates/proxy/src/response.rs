//! Response construction and the CORS contract
//!
//! Every response leaving the proxy carries the same four permissive
//! CORS headers, whether it is a proxied upstream reply, a synthesized
//! error, or a framework rejection. The headers are stamped by a
//! router-level middleware so no handler can forget them. `OPTIONS`
//! preflights are answered before any proxy work happens.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::forward::ForwardedResponse;

/// The four headers of the proxy's CORS contract.
fn cors_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET,HEAD,POST,OPTIONS")),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*")),
        (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400")),
    ]
}

/// Middleware stamping the CORS headers onto every outgoing response.
///
/// Installed at the router level, so extractor rejections and method
/// mismatches carry the headers as well.
pub async fn apply_cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in cors_headers() {
        headers.insert(name, value);
    }
    response
}

/// Builds a plain-text response, used for the ping reply and for error
/// bodies.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (status, [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))], body.into())
        .into_response()
}

/// Builds the client response for a completed forward: upstream status
/// and content-type copied through, body passed byte-for-byte, no other
/// upstream headers.
pub fn upstream_response(forwarded: ForwardedResponse) -> Response {
    let mut response = Response::new(Body::from(forwarded.body));
    *response.status_mut() = forwarded.status;
    if let Some(content_type) = forwarded.content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_cors_header_values() {
        let headers = cors_headers();
        assert_eq!(headers[0].0, header::ACCESS_CONTROL_ALLOW_ORIGIN);
        assert_eq!(headers[0].1, "*");
        assert_eq!(headers[1].1, "GET,HEAD,POST,OPTIONS");
        assert_eq!(headers[2].1, "*");
        assert_eq!(headers[3].1, "86400");
    }

    #[tokio::test]
    async fn test_plain_text_shape() {
        let response = plain_text(StatusCode::OK, "pong");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"pong");
    }

    #[tokio::test]
    async fn test_upstream_response_copies_status_and_content_type() {
        let forwarded = ForwardedResponse {
            status: StatusCode::CREATED,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from_static(b"{\"ok\":true}"),
        };
        let response = upstream_response(forwarded);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{\"ok\":true}");
    }

    #[test]
    fn test_upstream_response_without_content_type_sets_none() {
        let forwarded = ForwardedResponse {
            status: StatusCode::NO_CONTENT,
            content_type: None,
            body: Bytes::new(),
        };
        let response = upstream_response(forwarded);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
