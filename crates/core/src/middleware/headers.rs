use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

const NO_CACHE: &str = "no-store, no-cache, must-revalidate";

/// Stamp every response with the server name and, unless the route already chose
/// its own `Cache-Control`, forbid the browser from caching it.
pub async fn header_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::SERVER,
        HeaderValue::from_static(env!("CARGO_PKG_NAME")),
    );
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }
    response
}
