//! OAuth2 authorization-code login with PKCE against the appliance cloud.
//!
//! Flow: [`AuthSession::begin`] → open [`AuthSession::authorization_url`] in a
//! browser → [`intercept`] captures the redirect → the pipeline exchanges the
//! code for an access token.

pub mod authorize;
pub mod intercept;
pub mod pkce;
pub mod region;
pub mod session;

pub use authorize::{build_authorization_url, AuthorizationRequest};
pub use intercept::{AuthCodeInterceptor, NavigationDecision, NavigationHook};
pub use pkce::{derive_code_challenge, generate_nonce, PkceContext};
pub use region::{Region, RegionEndpoints};
pub use session::AuthSession;

/// Client identifier registered for the mobile app.
pub const CLIENT_ID: &str = "9B75AC9EC512F36C84256AC47D813E2C1DD0D6520DF774B020E1E6E2EB29B1F3";
pub const REDIRECT_URI: &str = "hcauth://auth/prod";
pub const SCOPE: &str = "Control DeleteAppliance IdentifyAppliance Images Monitor ReadAccount ReadOrigApi Settings WriteAppliance WriteOrigApi";
