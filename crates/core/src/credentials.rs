use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::fmt;

/// Header the browser uses to hand the personal access token to this server.
pub const PAT_HEADER: HeaderName = HeaderName::from_static("x-ado-pat");

/// A personal access token supplied by the client.
///
/// The token never leaves this type except as an upstream `Authorization` header.
pub struct Credential(String);

impl Credential {
    /// Read the token from [`PAT_HEADER`], treating an empty value as absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(PAT_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_owned()))
    }

    /// `Basic` authorization with an empty username and the token as password.
    pub fn authorization(&self) -> HeaderValue {
        let encoded = BASE64.encode(format!(":{}", self.0));
        let mut value = HeaderValue::try_from(format!("Basic {encoded}"))
            .expect("base64 output should always be a valid header value");
        value.set_sensitive(true);
        value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
