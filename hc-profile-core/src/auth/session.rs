use url::Url;

use super::authorize::{authorization_url_for, AuthorizationRequest};
use super::pkce::PkceContext;
use super::region::{Region, RegionEndpoints};
use super::{CLIENT_ID, REDIRECT_URI, SCOPE};
use crate::emit::OutputTarget;
use crate::error::ProfileError;

/// State of a single authentication attempt: endpoints, output target and
/// PKCE values. Consumed by [`crate::pipeline::run`], so a session can never be
/// reused for a second attempt.
#[derive(Debug)]
pub struct AuthSession {
    region: Region,
    endpoints: RegionEndpoints,
    target: OutputTarget,
    pkce: PkceContext,
}

impl AuthSession {
    /// Resolve region and target codes and generate fresh PKCE values.
    pub fn begin(region_code: &str, target: &str) -> Result<Self, ProfileError> {
        let region: Region = region_code.parse()?;
        let target: OutputTarget = target.parse()?;
        Ok(Self::with_endpoints(region, region.endpoints(), target))
    }

    /// Like [`AuthSession::begin`] but against explicit endpoints (staging
    /// hosts, local test servers).
    pub fn with_endpoints(region: Region, endpoints: RegionEndpoints, target: OutputTarget) -> Self {
        Self {
            region,
            endpoints,
            target,
            pkce: PkceContext::generate(),
        }
    }

    pub fn authorization_url(&self) -> Result<Url, ProfileError> {
        let request = AuthorizationRequest {
            region: self.region.code(),
            client_id: CLIENT_ID,
            redirect_uri: REDIRECT_URI,
            scope: SCOPE,
        };
        authorization_url_for(&self.endpoints.authorize_url(), &request, &self.pkce)
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn target(&self) -> OutputTarget {
        self.target
    }

    pub fn endpoints(&self) -> &RegionEndpoints {
        &self.endpoints
    }

    pub fn state(&self) -> &str {
        &self.pkce.state
    }

    pub(crate) fn code_verifier(&self) -> &str {
        &self.pkce.code_verifier
    }
}
