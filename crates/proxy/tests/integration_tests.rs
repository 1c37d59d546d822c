//! Integration tests for the Chaingate proxy server

use chaingate_proxy::{ProxyServer, ProxyServerBuilder};
use reqwest::Client;
use serde_json::json;
use std::{net::SocketAddr, time::Duration};
use tokio::time::sleep;
use wiremock::{
    matchers::{body_string, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Helper to create a test proxy server resolving through `rpc_urls`
fn create_test_proxy(rpc_urls: Vec<String>) -> ProxyServer {
    ProxyServerBuilder::new()
        .rpc_urls(rpc_urls)
        .rpc_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Start proxy server on a random port and return the address
async fn start_proxy_server(proxy: ProxyServer) -> SocketAddr {
    // Find an available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let actual_addr = listener.local_addr().unwrap();
    drop(listener); // Release the listener so proxy.serve can bind to it

    tokio::spawn(async move {
        proxy.serve(actual_addr).await.unwrap();
    });

    // Give the server a moment to start
    sleep(Duration::from_millis(200)).await;
    actual_addr
}

/// ABI-encodes `domain` the way the registry getter returns it
fn encoded_domain(domain: &str) -> String {
    let mut payload = format!("0x{:064x}{:064x}", 32, domain.len());
    let mut data = hex::encode(domain.as_bytes());
    while data.len() % 64 != 0 {
        data.push('0');
    }
    payload.push_str(&data);
    payload
}

/// Mounts an RPC mock answering the registry call with `domain`
async fn mock_rpc_returning(domain: &str, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": encoded_domain(domain),
        })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

/// Asserts the four CORS headers the proxy stamps on every response
fn assert_cors_headers(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(headers.get("access-control-allow-methods").unwrap(), "GET,HEAD,POST,OPTIONS");
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "*");
    assert_eq!(headers.get("access-control-max-age").unwrap(), "86400");
}

#[tokio::test]
async fn test_ping_answers_without_touching_rpc() {
    // The RPC endpoint must never be called for a ping
    let rpc = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&rpc).await;

    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response =
        client.get(format!("http://{proxy_addr}/proxy?e=ping_proxy")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_missing_endpoint_param_is_rejected() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&rpc).await;

    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();

    // No query parameter at all
    let response = client.get(format!("http://{proxy_addr}/proxy")).send().await.unwrap();
    assert_eq!(response.status(), 400);
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "Missing endpoint");

    // Present but empty counts as missing
    let response = client.get(format!("http://{proxy_addr}/proxy?e=")).send().await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "Missing endpoint");
}

#[tokio::test]
async fn test_options_preflight_returns_204() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&rpc).await;

    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{proxy_addr}/proxy"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_forwards_get_to_resolved_domain() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(
            // set_body_raw keeps the declared content-type; a body setter
            // would stamp its own MIME over an inserted header.
            ResponseTemplate::new(200).set_body_raw("upstream says hi".as_bytes(), "text/html"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .get(format!("http://{proxy_addr}/proxy?e=hello"))
        .header("cf-connecting-ip", "203.0.113.7")
        .header("origin", "https://site.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/html");
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "upstream says hi");

    // The upstream saw the client IP header and not the origin header
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let names: Vec<String> =
        requests[0].headers.iter().map(|(name, _)| name.as_str().to_lowercase()).collect();
    assert!(names.contains(&"x-dfkjldifjlifjd".to_string()));
    assert!(!names.contains(&"origin".to_string()));
}

#[tokio::test]
async fn test_forwards_post_body_to_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_string("payload-bytes"))
        .respond_with(ResponseTemplate::new(201).set_body_string("accepted"))
        .expect(1)
        .mount(&upstream)
        .await;

    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .post(format!("http://{proxy_addr}/proxy?e=submit"))
        .body("payload-bytes")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "accepted");
}

#[tokio::test]
async fn test_leading_slashes_in_endpoint_collapse() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deep/path"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(1)
        .mount(&upstream)
        .await;

    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .get(format!("http://{proxy_addr}/proxy?e=%2F%2F%2Fdeep%2Fpath"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "found");
}

#[tokio::test]
async fn test_resolution_falls_back_across_rpc_endpoints() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&upstream)
        .await;

    let bad_rpc = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&bad_rpc)
        .await;

    let good_rpc = mock_rpc_returning(&upstream.uri(), 1).await;

    let proxy = create_test_proxy(vec![bad_rpc.uri(), good_rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client.get(format!("http://{proxy_addr}/proxy?e=data")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_unresolvable_domain_yields_500() {
    let bad_rpc = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&bad_rpc)
        .await;

    let proxy = create_test_proxy(vec![bad_rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client.get(format!("http://{proxy_addr}/proxy?e=data")).send().await.unwrap();

    assert_eq!(response.status(), 500);
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "error: Could not fetch target domain");
}

#[tokio::test]
async fn test_domain_is_cached_across_requests() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&upstream)
        .await;

    // One resolution serves both proxied requests
    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    for _ in 0..2 {
        let response =
            client.get(format!("http://{proxy_addr}/proxy?e=data")).send().await.unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&upstream)
        .await;

    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response =
        client.get(format!("http://{proxy_addr}/proxy?e=missing")).send().await.unwrap();

    assert_eq!(response.status(), 404);
    assert_cors_headers(&response);
    assert_eq!(response.text().await.unwrap(), "nope");
}

#[tokio::test]
async fn test_unsupported_method_still_carries_cors() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&rpc).await;

    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client
        .request(reqwest::Method::PUT, format!("http://{proxy_addr}/proxy?e=data"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_head_requests_are_served() {
    let upstream = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    let rpc = mock_rpc_returning(&upstream.uri(), 1).await;
    let proxy = create_test_proxy(vec![rpc.uri()]);
    let proxy_addr = start_proxy_server(proxy).await;

    let client = Client::new();
    let response = client.head(format!("http://{proxy_addr}/proxy?e=data")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_cors_headers(&response);
}
