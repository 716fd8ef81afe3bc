use crate::{
    AppState,
    error::ProxyError,
    params::SearchParams,
    upstream::{ErrorBody, UpstreamResponse, UpstreamTarget},
};
use axum::{
    body::to_bytes,
    extract::Request,
    http::header,
    response::Response,
};
use tracing::debug;

/// `POST /identity-search`
///
/// The body is an identity picker query built by the page and is forwarded untouched.
pub async fn identity_search_handler(
    state: &AppState,
    request: Request,
) -> Result<Response, ProxyError> {
    let params = SearchParams::extract(
        request.headers(),
        state.settings.proxy_settings.default_server_url.as_str(),
    )?;

    let limit = state.settings.proxy_settings.max_request_body_size;
    if let Some(content_length) = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok()?.parse::<u64>().ok())
        && content_length > limit
    {
        return Err(ProxyError::RequestBodyTooLarge { limit });
    }
    let body = to_bytes(
        request.into_body(),
        usize::try_from(limit).unwrap_or(usize::MAX),
    )
    .await
    .map_err(|err| ProxyError::InvalidRequestBody(err.to_string()))?;

    let target = UpstreamTarget::identity_picker(&params.server_url, &params.org);
    debug!("Searching identities via {target} ({} byte query)", body.len());

    Ok(UpstreamResponse::fetch(
        state
            .client
            .post(target.to_string())
            .header(header::AUTHORIZATION, params.credential.authorization())
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())
            .body(body),
        ErrorBody::Include,
        &mime::APPLICATION_JSON,
    )
    .await?
    .into_response())
}
