mod avatar;
mod identity_resolve;
mod identity_search;

pub use avatar::*;
pub use identity_resolve::*;
pub use identity_search::*;

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::ServiceExt;

/// Where an incoming request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AvatarFetch,
    IdentityResolve,
    IdentitySearch,
    StaticFile,
    NotFound,
    UnsupportedMethod,
}

impl Route {
    /// Classify by method and by prefix of the path including its query string.
    ///
    /// The identity GET routes only match when a query string is present,
    /// a bare `/avatar` is looked up as a static file.
    pub fn classify(method: &Method, uri: &Uri) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());

        match *method {
            Method::GET if path.starts_with("/avatar?") => Self::AvatarFetch,
            Method::GET if path.starts_with("/identity-resolve?") => Self::IdentityResolve,
            Method::GET | Method::HEAD => Self::StaticFile,
            Method::POST if path.starts_with("/identity-search") => Self::IdentitySearch,
            Method::POST => Self::NotFound,
            _ => Self::UnsupportedMethod,
        }
    }
}

/// Entry point for every request the server receives.
pub async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match Route::classify(request.method(), request.uri()) {
        Route::AvatarFetch => avatar_handler(&state, request).await.into_response(),
        Route::IdentityResolve => identity_resolve_handler(&state, request)
            .await
            .into_response(),
        Route::IdentitySearch => identity_search_handler(&state, request)
            .await
            .into_response(),
        Route::StaticFile => state
            .static_files
            .clone()
            .oneshot(request)
            .await
            .into_response(),
        Route::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Route::UnsupportedMethod => {
            (StatusCode::NOT_IMPLEMENTED, "Unsupported method").into_response()
        }
    }
}
