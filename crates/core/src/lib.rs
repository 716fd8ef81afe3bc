//! Crate for ado-proxy, a local development server for Azure DevOps tool pages.
//!
//! Static pages are served from a directory, and three fixed routes proxy identity
//! requests to Azure DevOps with the caller's personal access token injected server-side.

#[cfg(feature = "rustls-tls")]
#[cfg(feature = "native-tls")]
compile_error!("You can only enable one TLS backend");

pub extern crate url;

mod credentials;
mod error;
mod http_client;
mod middleware;
mod mime_util;
mod params;
mod routes;
mod upstream;

use crate::http_client::{BuildHttpClientArgs, build_http_client};
use anyhow::Result;
use axum::{Router, http::header, middleware as axum_middleware};
use http_client::HttpClient;
use reqwest::Proxy;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{self, TraceLayer},
};
use tracing::{Level, info, warn};
use url::Url;

/// Server used when a request does not name one.
pub const DEFAULT_SERVER_URL: &str = "https://dev.azure.com";

/// # Example
/// ```rust,no_run
/// use std::net::{SocketAddr, IpAddr, Ipv4Addr};
/// use ado_proxy::{AdoProxyServer, AdoProxyServerSettings};
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = AdoProxyServer::new(AdoProxyServerSettings::default()).unwrap();
/// server.start(&SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000)).await.unwrap();
/// # }
/// ```
#[derive(Debug)]
pub struct AdoProxyServer {
    router_inner: Router,
    static_directory: PathBuf,
}

/// Settings to run the server with.
#[derive(Debug, Clone)]
pub struct AdoProxyServerSettings {
    /// How many seconds that can elapse before an incoming request is abandoned for taking too long.
    pub request_timeout: u64,

    /// Directory that static pages are served from.
    pub static_directory: PathBuf,

    /// See [`ProxySettings`].
    pub proxy_settings: ProxySettings,

    /// See [`UpstreamSettings`].
    pub upstream_settings: UpstreamSettings,
}

/// Configuration options used by the proxy routes.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Server used when the request does not carry a `serverUrl` parameter or `X-ADO-Server` header.
    pub default_server_url: Url,

    /// The maximum body size accepted by the identity search route.
    pub max_request_body_size: u64,
}

/// Configuration options used when making any call to an upstream server regardless of route.
///
/// The upstream request timeout is fixed at ten seconds and is not configurable.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Whether to allow invalid/expired/self-signed TLS certificates when making upstream requests.
    ///
    /// **Enabling this is dangerous** and should only be used against on-premises servers you trust.
    pub allow_invalid_certs: bool,

    /// The maximum amount of redirects to follow when making a request to an upstream server before abandoning the request.
    pub max_redirects: usize,

    /// The proxy to use for all outgoing requests.
    pub request_proxy: Option<Url>,
}

impl Default for AdoProxyServerSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            static_directory: PathBuf::from("."),
            proxy_settings: ProxySettings::default(),
            upstream_settings: UpstreamSettings::default(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            default_server_url: Url::parse(DEFAULT_SERVER_URL)
                .expect("default server url should be valid"),
            max_request_body_size: 10_000_000,
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            allow_invalid_certs: false,
            max_redirects: 5,
            request_proxy: None,
        }
    }
}

#[derive(Debug)]
struct AppState {
    client: HttpClient,
    settings: AdoProxyServerSettings,
    static_files: ServeDir,
}

impl AdoProxyServer {
    /// Create a new server with the provided settings.
    pub fn new(settings: AdoProxyServerSettings) -> Result<Self> {
        let static_directory = settings.static_directory.clone();
        let router = Router::new()
            .fallback(routes::dispatch)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(SetSensitiveRequestHeadersLayer::new([
                credentials::PAT_HEADER,
                header::AUTHORIZATION,
            ]))
            .layer(TimeoutLayer::new(Duration::from_secs(
                settings.request_timeout,
            )))
            .layer(CatchPanicLayer::new())
            .layer(axum_middleware::from_fn(middleware::header_middleware))
            .with_state(Arc::new(AppState {
                client: build_http_client(BuildHttpClientArgs {
                    allow_invalid_certs: settings.upstream_settings.allow_invalid_certs,
                    max_redirects: settings.upstream_settings.max_redirects,
                    proxy: settings
                        .upstream_settings
                        .request_proxy
                        .as_ref()
                        .map(|p| Proxy::all(p.as_str()))
                        .transpose()?,
                })?,
                static_files: ServeDir::new(&static_directory),
                settings,
            }));

        Ok(Self {
            router_inner: router,
            static_directory,
        })
    }

    /// Consume the server and return its [`Router`] without binding a socket.
    pub fn into_router(self) -> Router {
        self.router_inner
    }

    /// Start the server and expose it on the provided [`SocketAddr`].
    pub async fn start(self, address: &SocketAddr) -> Result<()> {
        let tcp_listener = TcpListener::bind(&address).await?;
        let local_addr = tcp_listener.local_addr()?;
        info!("Listening on http://{local_addr}");
        info!(
            "Serving static files from {}",
            self.static_directory
                .canonicalize()
                .unwrap_or_else(|_| self.static_directory.clone())
                .display()
        );
        match available_pages(&self.static_directory) {
            Ok(pages) => {
                for page in pages {
                    info!(
                        "Available page: http://localhost:{}/{page}",
                        local_addr.port()
                    );
                }
            }
            Err(err) => warn!("Unable to list static pages: {err}"),
        }

        axum::serve(tcp_listener, self.router_inner)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }

    // https://github.com/tokio-rs/axum/blob/15917c6dbcb4a48707a20e9cfd021992a279a662/examples/graceful-shutdown/src/main.rs#L55
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}

/// HTML pages at the top level of `directory`, sorted by name.
fn available_pages(directory: &Path) -> std::io::Result<Vec<String>> {
    let mut pages = std::fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".html"))
        .collect::<Vec<_>>();
    pages.sort();
    Ok(pages)
}
