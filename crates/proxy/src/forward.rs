//! Outbound request construction and dispatch
//!
//! Turns an inbound request plus a resolved domain into the upstream
//! call: connection-specific headers dropped, the client IP forwarded
//! under a fixed legacy header, the body passed through untouched for
//! body-carrying methods. Redirects are followed; every forward is a
//! fresh request with no response caching.

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
};
use eyre::Result;
use tracing::debug;

use crate::error::ProxyError;

/// Header carrying the derived client IP to the upstream.
///
/// The wire name is an opaque identifier the upstream matches verbatim;
/// the name itself is the contract, so refer to it only through this
/// constant.
pub const CLIENT_IP_HEADER: &str = "x-dfkjldifjlifjd";

/// Headers never forwarded upstream. The transport re-derives `host`
/// and `content-length` for the outbound leg; the others must not leak
/// through a proxy hop.
const STRIPPED_HEADERS: [&str; 5] =
    ["host", "origin", "accept-encoding", "content-encoding", "content-length"];

/// Everything the forwarder needs from the inbound request.
#[derive(Debug)]
pub struct ProxyRequestContext {
    /// Inbound HTTP method, reused for the outbound call.
    pub method: Method,
    /// Inbound headers, prior to filtering.
    pub headers: HeaderMap,
    /// Inbound body bytes; attached upstream only for body-carrying methods.
    pub body: Bytes,
    /// Upstream endpoint path taken from the query parameter.
    pub endpoint: String,
}

/// A completed upstream exchange, reduced to what the client response
/// carries.
#[derive(Debug)]
pub struct ForwardedResponse {
    /// Upstream status code, copied through verbatim.
    pub status: StatusCode,
    /// Upstream `content-type`, when present.
    pub content_type: Option<HeaderValue>,
    /// Raw response body.
    pub body: Bytes,
}

/// Issues upstream requests on behalf of inbound clients.
#[derive(Debug)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Creates a forwarder whose client follows up to 10 redirects.
    pub fn new() -> Result<Self> {
        let client =
            reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10)).build()?;
        Ok(Self { client })
    }

    /// Forwards the request to `domain`, returning the reduced upstream
    /// response. Failures sending the request or reading the body
    /// surface as [`ProxyError::Upstream`].
    pub async fn forward(
        &self,
        ctx: ProxyRequestContext,
        domain: &str,
    ) -> Result<ForwardedResponse, ProxyError> {
        let target = format!("{}/{}", domain, ctx.endpoint.trim_start_matches('/'));

        let mut headers = filter_headers(&ctx.headers);
        let ip = client_ip(&ctx.headers);
        let ip_value =
            HeaderValue::from_str(&ip).unwrap_or_else(|_| HeaderValue::from_static(""));
        headers.insert(HeaderName::from_static(CLIENT_IP_HEADER), ip_value);

        debug!(method = %ctx.method, target = %target, "forwarding request");

        let mut request = self.client.request(ctx.method.clone(), target.as_str()).headers(headers);
        if method_carries_body(&ctx.method) {
            request = request.body(ctx.body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        Ok(ForwardedResponse { status, content_type, body })
    }
}

/// Removes the headers that must not travel upstream, preserving the
/// rest, duplicates included.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in headers {
        if STRIPPED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Derives the client IP from the usual proxy headers.
///
/// `cf-connecting-ip` wins, then `x-forwarded-for`, then `x-real-ip`.
/// The first two may carry a comma-separated hop chain and only the
/// first hop counts; `x-real-ip` is taken verbatim. A present but empty
/// header falls through to the next source; the result is empty when
/// nothing matches.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(value) = header_str(headers, "cf-connecting-ip") {
        return first_hop(value);
    }
    if let Some(value) = header_str(headers, "x-forwarded-for") {
        return first_hop(value);
    }
    if let Some(value) = header_str(headers, "x-real-ip") {
        return value.to_string();
    }
    String::new()
}

/// Returns the named header as a non-empty string, when present.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).filter(|value| !value.is_empty())
}

/// First element of a comma-separated hop chain, trimmed.
fn first_hop(value: &str) -> String {
    value.split(',').next().unwrap_or_default().trim().to_string()
}

/// Whether the method is expected to carry a request body.
fn method_carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}
