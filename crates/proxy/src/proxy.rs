//! Core proxy server implementation

use crate::{
    cache::DEFAULT_CACHE_TTL,
    error::ProxyError,
    forward::{Forwarder, ProxyRequestContext},
    resolver::{DomainResolver, DEFAULT_CONTRACT_ADDRESS, DEFAULT_RPC_URLS},
    response::{apply_cors, plain_text, upstream_response},
};
use alloy_primitives::Address;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use eyre::Result;
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Path the proxy answers on. Alias paths (legacy `.php` endpoints) are
/// mapped to this one by external routing.
pub const PROXY_PATH: &str = "/proxy";

/// Endpoint selector value reserved for liveness checks.
pub const PING_SENTINEL: &str = "ping_proxy";

/// Default timeout for a single RPC resolution attempt.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for configuring ProxyServer with fluent API and sensible defaults
#[derive(Debug, Clone)]
pub struct ProxyServerBuilder {
    rpc_urls: Option<Vec<String>>,
    contract_address: String,
    cache_ttl: Duration,
    rpc_timeout: Duration,
}

impl Default for ProxyServerBuilder {
    fn default() -> Self {
        Self {
            // Domain Resolution Configuration
            rpc_urls: None, // Will use DEFAULT_RPC_URLS
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),

            // Cache / RPC Client Configuration
            cache_ttl: DEFAULT_CACHE_TTL,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }
}

impl ProxyServerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom RPC URLs, tried in the given order
    pub fn rpc_urls<T: Into<Vec<String>>>(mut self, urls: T) -> Self {
        self.rpc_urls = Some(urls.into());
        self
    }

    /// Set custom RPC URLs from comma-separated string
    pub fn rpc_urls_str(mut self, urls: &str) -> Self {
        self.rpc_urls =
            Some(urls.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect());
        self
    }

    /// Set the domain registry contract address (0x-prefixed hex)
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = address.into();
        self
    }

    /// Set how long a resolved domain stays cached
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the timeout for a single RPC resolution attempt
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Build the ProxyServer with the configured settings
    pub fn build(self) -> Result<ProxyServer> {
        let rpc_urls = self
            .rpc_urls
            .unwrap_or_else(|| DEFAULT_RPC_URLS.iter().map(|s| s.to_string()).collect());

        ProxyServer::new(rpc_urls, &self.contract_address, self.cache_ttl, self.rpc_timeout)
    }
}

/// Contract-directed reverse proxy server
///
/// Coordinates the per-request pipeline: endpoint validation, domain
/// resolution (cached, with RPC endpoint fallback), upstream forwarding,
/// and CORS-stamped responses.
///
/// Use ProxyServerBuilder for configuration:
/// ```no_run
/// # use chaingate_proxy::proxy::ProxyServerBuilder;
/// # use std::time::Duration;
/// # fn example() -> eyre::Result<()> {
/// let proxy = ProxyServerBuilder::new()
///     .rpc_urls_str("https://bsc.drpc.org,https://rpc.ankr.com/bsc")
///     .cache_ttl(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProxyServer {
    resolver: Arc<DomainResolver>,
    forwarder: Arc<Forwarder>,
}

#[derive(Clone)]
struct AppState {
    proxy: ProxyServer,
}

impl ProxyServer {
    /// Creates a new proxy server from concrete configuration values.
    /// Use ProxyServerBuilder for the fluent API.
    fn new(
        rpc_urls: Vec<String>,
        contract_address: &str,
        cache_ttl: Duration,
        rpc_timeout: Duration,
    ) -> Result<Self> {
        let contract_address: Address = contract_address
            .parse()
            .map_err(|e| eyre::eyre!("invalid contract address {contract_address:?}: {e}"))?;

        info!("Starting Chaingate proxy with {} RPC endpoints", rpc_urls.len());
        for url in &rpc_urls {
            info!("  - {}", url);
        }
        info!(
            contract = %contract_address,
            cache_ttl_secs = cache_ttl.as_secs(),
            "Domain resolution configured"
        );

        let resolver =
            Arc::new(DomainResolver::new(rpc_urls, contract_address, cache_ttl, rpc_timeout)?);
        let forwarder = Arc::new(Forwarder::new()?);

        Ok(Self { resolver, forwarder })
    }

    /// Builds the axum router serving the proxy endpoint.
    ///
    /// The CORS middleware wraps the whole router, so every response it
    /// produces carries the CORS contract, extractor rejections included.
    pub fn into_router(self) -> Router {
        Router::new()
            .route(PROXY_PATH, get(handle_proxy).post(handle_proxy).options(handle_preflight))
            .layer(middleware::from_fn(apply_cors))
            .layer(TraceLayer::new_for_http())
            .with_state(AppState { proxy: self })
    }

    /// Starts the proxy server listening on the specified address,
    /// running until a shutdown signal arrives.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let app = self.into_router();

        let listener = TcpListener::bind(addr).await?;
        info!("Chaingate proxy listening on {}", addr);

        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, stopping proxy server");
}

/// Query parameters recognized by the proxy endpoint.
#[derive(Debug, Deserialize)]
struct ProxyParams {
    /// Upstream endpoint path, or the ping sentinel.
    e: Option<String>,
}

/// Handles `GET|HEAD|POST` on the proxy path.
async fn handle_proxy(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match proxy_request(&state.proxy, method, params, headers, body).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                ProxyError::MissingEndpoint => debug!("rejected request without endpoint"),
                other => warn!(error = %other, "request could not be proxied"),
            }
            err.into_response()
        }
    }
}

/// Answers `OPTIONS` preflights: 204 with only the CORS headers.
async fn handle_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Runs one request through validate, ping short-circuit, resolve,
/// forward.
async fn proxy_request(
    proxy: &ProxyServer,
    method: Method,
    params: ProxyParams,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    // An empty selector is treated the same as an absent one.
    let endpoint = match params.e {
        Some(e) if !e.is_empty() => e,
        _ => return Err(ProxyError::MissingEndpoint),
    };

    if endpoint == PING_SENTINEL {
        return Ok(plain_text(StatusCode::OK, "pong"));
    }

    let domain = proxy.resolver.resolve().await?;
    let ctx = ProxyRequestContext { method, headers, body, endpoint };
    let forwarded = proxy.forwarder.forward(ctx, &domain).await?;

    Ok(upstream_response(forwarded))
}
