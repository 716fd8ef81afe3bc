use crate::{
    AppState,
    error::ProxyError,
    params::IdentityParams,
    upstream::{ErrorBody, UpstreamResponse, UpstreamTarget},
};
use axum::{extract::Request, http::header, response::Response};
use tracing::debug;

/// `GET /identity-resolve?id=&org=&serverUrl=`
pub async fn identity_resolve_handler(
    state: &AppState,
    request: Request,
) -> Result<Response, ProxyError> {
    let params = IdentityParams::extract(
        request.uri(),
        request.headers(),
        state.settings.proxy_settings.default_server_url.as_str(),
    )?;

    let target = UpstreamTarget::identity(&params.server_url, &params.org, &params.id);
    debug!("Resolving identity via {target}");

    Ok(UpstreamResponse::fetch(
        state
            .client
            .get(target.to_string())
            .header(header::AUTHORIZATION, params.credential.authorization()),
        ErrorBody::Discard,
        &mime::APPLICATION_JSON,
    )
    .await?
    .into_response())
}
