use anyhow::Result;
use reqwest::{Proxy, redirect::Policy};
use std::time::Duration;

pub type HttpClient = reqwest::Client;

/// Upstream calls are abandoned after this long; there is no retry.
pub const UPSTREAM_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BuildHttpClientArgs {
    pub allow_invalid_certs: bool,
    pub max_redirects: usize,
    pub proxy: Option<Proxy>,
}

/// Create a new [`HttpClient`] with the given arguments.
///
/// Only an explicitly configured proxy is used, proxy environment variables are ignored.
pub fn build_http_client(args: BuildHttpClientArgs) -> Result<HttpClient> {
    let mut builder = reqwest::ClientBuilder::default()
        .redirect(Policy::limited(args.max_redirects))
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .danger_accept_invalid_certs(args.allow_invalid_certs)
        .connect_timeout(Duration::from_secs(5))
        .timeout(UPSTREAM_REQUEST_TIMEOUT);
    builder = match args.proxy {
        Some(proxy) => builder.proxy(proxy),
        None => builder.no_proxy(),
    };
    Ok(builder.build()?)
}
