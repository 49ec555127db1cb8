use url::Url;

use super::pkce::PkceContext;
use super::region::Region;
use crate::error::ProfileError;

/// Client identity and region for one authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub region: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub scope: &'a str,
}

/// Build the URL the user has to open to log in.
///
/// Parameters are appended in a fixed order, each exactly once.
pub fn build_authorization_url(
    request: &AuthorizationRequest<'_>,
    pkce: &PkceContext,
) -> Result<Url, ProfileError> {
    let region: Region = request.region.parse()?;
    authorization_url_for(&region.endpoints().authorize_url(), request, pkce)
}

pub(crate) fn authorization_url_for(
    authorize_url: &str,
    request: &AuthorizationRequest<'_>,
    pkce: &PkceContext,
) -> Result<Url, ProfileError> {
    let mut url = Url::parse(authorize_url).map_err(|e| {
        ProfileError::Configuration(format!("invalid authorize url {authorize_url}: {e}"))
    })?;
    url.query_pairs_mut()
        .append_pair("redirect_url", request.redirect_uri)
        .append_pair("client_id", request.client_id)
        .append_pair("response_type", "code")
        .append_pair("prompt", "login")
        .append_pair("code_challenge_method", pkce.challenge_method())
        .append_pair("code_challenge", &pkce.code_challenge)
        .append_pair("state", &pkce.state)
        .append_pair("nonce", &pkce.nonce)
        .append_pair("scope", request.scope);
    Ok(url)
}
