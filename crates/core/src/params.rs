use crate::{credentials::Credential, error::ProxyError};
use axum::{
    extract::Query,
    http::{HeaderMap, HeaderName, Uri},
};
use serde::Deserialize;

/// Organization header used by the search route.
pub const ORG_HEADER: HeaderName = HeaderName::from_static("x-ado-org");

/// Optional server header used by the search route.
pub const SERVER_HEADER: HeaderName = HeaderName::from_static("x-ado-server");

#[derive(Debug, Default, Deserialize)]
struct IdentityQuery {
    id: Option<String>,
    org: Option<String>,
    #[serde(rename = "serverUrl")]
    server_url: Option<String>,
}

/// Validated inputs of the avatar and identity-resolve routes.
#[derive(Debug)]
pub struct IdentityParams {
    pub id: String,
    pub org: String,
    pub server_url: String,
    pub credential: Credential,
}

impl IdentityParams {
    /// Pull `id`, `org` and `serverUrl` from the query string and the credential from the headers.
    ///
    /// An unparsable query string is treated the same as one with the parameters missing.
    pub fn extract(
        uri: &Uri,
        headers: &HeaderMap,
        default_server_url: &str,
    ) -> Result<Self, ProxyError> {
        let query = Query::<IdentityQuery>::try_from_uri(uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        let (Some(id), Some(org), Some(credential)) = (
            non_empty(query.id),
            non_empty(query.org),
            Credential::from_headers(headers),
        ) else {
            return Err(ProxyError::MissingParameters);
        };

        Ok(Self {
            id,
            org,
            server_url: non_empty(query.server_url)
                .unwrap_or_else(|| default_server_url.to_owned()),
            credential,
        })
    }
}

/// Validated inputs of the identity-search route.
#[derive(Debug)]
pub struct SearchParams {
    pub org: String,
    pub server_url: String,
    pub credential: Credential,
}

impl SearchParams {
    /// Pull the credential, organization and optional server from the request headers.
    pub fn extract(headers: &HeaderMap, default_server_url: &str) -> Result<Self, ProxyError> {
        let (Some(credential), Some(org)) = (
            Credential::from_headers(headers),
            header_str(headers, &ORG_HEADER),
        ) else {
            return Err(ProxyError::MissingHeaders);
        };

        Ok(Self {
            org,
            server_url: header_str(headers, &SERVER_HEADER)
                .unwrap_or_else(|| default_server_url.to_owned()),
            credential,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
