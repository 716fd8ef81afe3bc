use crate::{error::ProxyError, mime_util};
use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::Response,
};
use bytes::Bytes;
use mime::Mime;
use reqwest::RequestBuilder;
use std::fmt;
use tracing::warn;

/// Hosted server whose identity API lives on a dedicated subdomain.
const CLOUD_HOST: &str = "dev.azure.com";
const CLOUD_IDENTITY_HOST: &str = "https://vssps.dev.azure.com";

/// A fully determined upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    base: String,
    org: String,
    resource: String,
    query: String,
}

impl UpstreamTarget {
    /// Identity image (avatar) endpoint.
    pub fn identity_image(server_url: &str, org: &str, id: &str) -> Self {
        Self {
            base: trim_server_url(server_url).to_owned(),
            org: org.to_owned(),
            resource: "_api/_common/identityImage".to_owned(),
            query: format!("id={id}"),
        }
    }

    /// Identity lookup by id.
    ///
    /// On the hosted service identities are served from `vssps.dev.azure.com`,
    /// on-premises servers serve them from the collection host itself.
    pub fn identity(server_url: &str, org: &str, id: &str) -> Self {
        let server_url = trim_server_url(server_url);
        let base = if server_url.contains(CLOUD_HOST) {
            CLOUD_IDENTITY_HOST
        } else {
            server_url
        };
        Self {
            base: base.to_owned(),
            org: org.to_owned(),
            resource: format!("_apis/identities/{}", urlencoding::encode(id)),
            query: "api-version=6.0".to_owned(),
        }
    }

    /// Identity picker search endpoint.
    pub fn identity_picker(server_url: &str, org: &str) -> Self {
        Self {
            base: trim_server_url(server_url).to_owned(),
            org: org.to_owned(),
            resource: "_apis/IdentityPicker/Identities".to_owned(),
            query: "api-version=5.1-preview.1".to_owned(),
        }
    }

    /// Server and organization segment that the resource is resolved against.
    pub fn organization_base(&self) -> String {
        format!("{}/{}", self.base, self.org)
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}?{}",
            self.organization_base(),
            self.resource,
            self.query
        )
    }
}

fn trim_server_url(server_url: &str) -> &str {
    server_url.strip_suffix('/').unwrap_or(server_url)
}

/// Whether a rejected upstream response should have its body included in the relayed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBody {
    Discard,
    Include,
}

/// A successful upstream response ready to be relayed.
#[derive(Debug)]
pub struct UpstreamResponse {
    content_type: HeaderValue,
    body: Bytes,
}

impl UpstreamResponse {
    /// Send `request` once and collect the body of a successful response.
    ///
    /// Non-2xx statuses become [`ProxyError::UpstreamRejected`]; transport failures
    /// are classified by [`ProxyError`]'s `From<reqwest::Error>`.
    pub async fn fetch(
        request: RequestBuilder,
        error_body: ErrorBody,
        fallback_content_type: &Mime,
    ) -> Result<Self, ProxyError> {
        let response = request.send().await.map_err(|err| {
            warn!("Failed to make request to upstream server: {err:?}");
            ProxyError::from(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Upstream returned unsuccessful status code {status}");
            let body = match error_body {
                ErrorBody::Discard => None,
                // Best effort, an unreadable body still relays the status.
                ErrorBody::Include => Some(
                    response
                        .bytes()
                        .await
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        .unwrap_or_default(),
                ),
            };
            return Err(ProxyError::rejected(status, body));
        }

        let content_type =
            mime_util::content_type_or(response.headers(), fallback_content_type);
        let body = response.bytes().await.map_err(|err| {
            warn!("Failed to read response body from upstream server: {err:?}");
            ProxyError::Internal(err.to_string())
        })?;

        Ok(Self { content_type, body })
    }

    /// Relay as a `200 OK` with the upstream content type and exact content length.
    pub fn into_response(self) -> Response {
        let content_length = HeaderValue::from(self.body.len());
        let mut response = Response::new(Body::from(self.body));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, self.content_type);
        headers.insert(header::CONTENT_LENGTH, content_length);
        response
    }
}
