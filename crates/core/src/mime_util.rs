use axum::http::{HeaderMap, HeaderValue, header};
use mime::Mime;

/// The upstream `Content-Type` if it is present and a valid MIME type, otherwise `fallback`.
pub fn content_type_or(headers: &HeaderMap, fallback: &Mime) -> HeaderValue {
    headers
        .get(header::CONTENT_TYPE)
        .filter(|v| {
            v.to_str()
                .ok()
                .and_then(|s| s.parse::<Mime>().ok())
                .is_some()
        })
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(fallback.as_ref())
                .expect("header value from mime string should always be valid")
        })
}
