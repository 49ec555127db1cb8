//! # contract: the seam between the pipeline and the appliance cloud
//!
//! The pipeline only talks to the provider through [`ApplianceApi`], so it can be
//! driven by the real [`crate::client::HomeConnectClient`] or by a `mockall` mock
//! in tests. Plain data returned across the seam lives here too.
//!
//! ## Mocking & Testing
//! - `MockApplianceApi` is generated for unit tests and, with the default
//!   `test-export-mocks` feature, for integration tests and downstream crates.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::archive::ApplianceArchive;
use crate::error::ProfileError;

/// How the local connection to an appliance is secured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "connectionType")]
pub enum Credential {
    #[serde(rename = "TLS")]
    Tls { key: String },
    #[serde(rename = "AES")]
    Aes { key: String, iv: String },
}

/// One appliance registered to the account. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceRecord {
    pub identifier: String,
    pub appliance_type: String,
    pub serial_number: String,
    pub brand: String,
    pub vib: String,
    pub mac: String,
    pub credential: Credential,
}

/// Calls against the provider API. Implementations do not retry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ApplianceApi: Send + Sync {
    /// Exchange an authorization code plus PKCE verifier for an access token.
    async fn exchange_token(
        &self,
        token_url: &str,
        code: &str,
        code_verifier: &str,
    ) -> Result<String, ProfileError>;

    /// List the appliances registered to the account. An account without
    /// appliances yields `Ok(vec![])`.
    async fn list_appliances(
        &self,
        account_details_url: &str,
        access_token: &str,
    ) -> Result<Vec<ApplianceRecord>, ProfileError>;

    /// Download the asset zip of one appliance from `url_prefix + appliance_id`.
    async fn fetch_appliance_zip(
        &self,
        url_prefix: &str,
        access_token: &str,
        appliance_id: &str,
    ) -> Result<ApplianceArchive, ProfileError>;
}
