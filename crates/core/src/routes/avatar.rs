use crate::{
    AppState,
    error::ProxyError,
    params::IdentityParams,
    upstream::{ErrorBody, UpstreamResponse, UpstreamTarget},
};
use axum::{
    extract::Request,
    http::{HeaderValue, header},
    response::Response,
};
use tracing::debug;

/// Avatars are immutable per identity, so the browser may keep them for a week.
const AVATAR_CACHE_CONTROL: &str = "max-age=604800";

/// `GET /avatar?id=&org=&serverUrl=`
pub async fn avatar_handler(state: &AppState, request: Request) -> Result<Response, ProxyError> {
    let params = IdentityParams::extract(
        request.uri(),
        request.headers(),
        state.settings.proxy_settings.default_server_url.as_str(),
    )?;

    let target = UpstreamTarget::identity_image(&params.server_url, &params.org, &params.id);
    debug!("Fetching avatar from {target}");

    let upstream = UpstreamResponse::fetch(
        state
            .client
            .get(target.to_string())
            .header(header::AUTHORIZATION, params.credential.authorization()),
        ErrorBody::Discard,
        &mime::IMAGE_PNG,
    )
    .await?;

    let mut response = upstream.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(AVATAR_CACHE_CONTROL));
    Ok(response)
}
