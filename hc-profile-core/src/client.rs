//! `reqwest` implementation of [`ApplianceApi`] against the appliance cloud.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::archive::ApplianceArchive;
use crate::auth::{CLIENT_ID, REDIRECT_URI};
use crate::contract::{ApplianceApi, ApplianceRecord, Credential};
use crate::error::ProfileError;

/// The login pages only render for mobile browsers.
pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36";

const WRONG_REGION: &str = "Wrong region used! Try a different region.";

#[derive(Debug, Clone)]
pub struct HomeConnectClient {
    client: reqwest::Client,
}

impl HomeConnectClient {
    /// Every request, including body download, is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProfileError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProfileError::Configuration(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountDetails {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountData {
    #[serde(default)]
    home_appliances: Vec<RawAppliance>,
}

#[derive(Debug, Deserialize)]
struct RawAppliance {
    identifier: String,
    #[serde(rename = "type")]
    appliance_type: String,
    #[serde(default)]
    serialnumber: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    vib: String,
    #[serde(default)]
    mac: String,
    tls: Option<RawTls>,
    aes: Option<RawAes>,
}

#[derive(Debug, Deserialize)]
struct RawTls {
    key: Option<String>,
}

/// Only required when no TLS key is present.
#[derive(Debug, Deserialize)]
struct RawAes {
    key: Option<String>,
    iv: Option<String>,
}

impl RawAppliance {
    /// A TLS key wins over AES parameters when both are present.
    fn into_record(self) -> Result<ApplianceRecord, ProfileError> {
        let credential = match (self.tls.and_then(|t| t.key), self.aes) {
            (Some(key), _) => Credential::Tls { key },
            (None, Some(RawAes { key: Some(key), iv: Some(iv) })) => Credential::Aes { key, iv },
            (None, Some(_)) => {
                return Err(ProfileError::InvalidResponse(format!(
                    "appliance {} has an incomplete AES block",
                    self.identifier
                )))
            }
            (None, None) => {
                return Err(ProfileError::InvalidResponse(format!(
                    "appliance {} has neither TLS nor AES credentials",
                    self.identifier
                )))
            }
        };
        Ok(ApplianceRecord {
            identifier: self.identifier,
            appliance_type: self.appliance_type,
            serial_number: self.serialnumber,
            brand: self.brand,
            vib: self.vib,
            mac: self.mac,
            credential,
        })
    }
}

#[async_trait]
impl ApplianceApi for HomeConnectClient {
    async fn exchange_token(
        &self,
        token_url: &str,
        code: &str,
        code_verifier: &str,
    ) -> Result<String, ProfileError> {
        if code.is_empty() {
            return Err(ProfileError::Authentication(
                "Login redirect did not contain an authorization code".to_string(),
            ));
        }
        info!(url = %token_url, "Exchanging authorization code for access token");

        let response = self
            .client
            .post(token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", CLIENT_ID),
                ("code_verifier", code_verifier),
                ("code", code),
                ("redirect_uri", REDIRECT_URI),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), url = %token_url, "Could not fetch token");
            return Err(ProfileError::Http {
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProfileError::InvalidResponse(format!("token response: {e}")))?;
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ProfileError::Authentication(
                    "Token response did not contain an access token".to_string(),
                )
            })
    }

    async fn list_appliances(
        &self,
        account_details_url: &str,
        access_token: &str,
    ) -> Result<Vec<ApplianceRecord>, ProfileError> {
        info!(url = %account_details_url, "Fetching appliance information");

        let response = self
            .client
            .get(account_details_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!(url = %account_details_url, "Account endpoint rejected the token");
            return Err(ProfileError::Authentication(WRONG_REGION.to_string()));
        }
        if !status.is_success() {
            error!(status = status.as_u16(), url = %account_details_url, "Could not fetch appliance information");
            return Err(ProfileError::Http {
                status: status.as_u16(),
            });
        }

        let details: AccountDetails = response
            .json()
            .await
            .map_err(|e| ProfileError::InvalidResponse(format!("account details: {e}")))?;
        let appliances = details
            .data
            .home_appliances
            .into_iter()
            .map(RawAppliance::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        for appliance in &appliances {
            debug!(
                appliance_id = %appliance.identifier,
                appliance_type = %appliance.appliance_type,
                serial_number = %appliance.serial_number,
                "Found appliance"
            );
        }
        info!(count = appliances.len(), "Appliance information received");
        Ok(appliances)
    }

    async fn fetch_appliance_zip(
        &self,
        url_prefix: &str,
        access_token: &str,
        appliance_id: &str,
    ) -> Result<ApplianceArchive, ProfileError> {
        let url = format!("{url_prefix}{appliance_id}");
        info!(url = %url, appliance_id, "Loading appliance XMLs");

        let response = self.client.get(&url).bearer_auth(access_token).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), url = %url, "Could not load appliance archive");
            return Err(ProfileError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let archive = ApplianceArchive::from_bytes(&bytes)?;
        debug!(appliance_id, entries = archive.len(), "Appliance archive loaded");
        Ok(archive)
    }
}
