use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::error::Error as StdError;
use thiserror::Error;

/// Body sent to the client whenever a proxy route fails.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// Everything that can go wrong while handling one of the proxy routes.
///
/// Each variant maps to exactly one response status, see [`ProxyError::status`].
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A query parameter or the credential header of an identity route was absent or empty.
    #[error("Missing required parameters: id, org, and X-ADO-PAT header")]
    MissingParameters,

    /// The credential or organization header of the search route was absent or empty.
    #[error("Missing required headers: X-ADO-PAT and X-ADO-Org")]
    MissingHeaders,

    /// The declared request body is larger than the server accepts.
    #[error("Request body exceeds the maximum allowed size of {limit} bytes")]
    RequestBodyTooLarge {
        /// Configured limit in bytes.
        limit: u64,
    },

    /// The request body could not be read.
    #[error("Failed to read request body: {0}")]
    InvalidRequestBody(String),

    /// Upstream answered with a non-success status.
    #[error(
        "Upstream error: {reason}{}",
        .body.as_deref().map(|body| format!(" - {body}")).unwrap_or_default()
    )]
    UpstreamRejected {
        /// Status received from upstream, relayed as-is.
        status: StatusCode,
        /// Reason phrase for `status`.
        reason: String,
        /// Decoded upstream error body, only captured by routes that surface it.
        body: Option<String>,
    },

    /// Upstream could not be reached (DNS, connect, TLS, timeout).
    #[error("Failed to reach upstream: {0}")]
    UpstreamUnreachable(String),

    /// Any other failure while proxying.
    #[error("Proxy error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Status code the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameters | Self::MissingHeaders | Self::InvalidRequestBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RequestBodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamRejected { status, .. } => *status,
            Self::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build an [`ProxyError::UpstreamRejected`] for `status`, optionally carrying the upstream body.
    pub fn rejected(status: StatusCode, body: Option<String>) -> Self {
        Self::UpstreamRejected {
            status,
            reason: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_owned(),
            body,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        let description = describe(&err);
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::UpstreamUnreachable(description)
        } else {
            Self::Internal(description)
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Render an error together with its chain of sources.
///
/// reqwest keeps the useful part (e.g. "Connection refused") in the source chain.
fn describe(err: &dyn StdError) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
