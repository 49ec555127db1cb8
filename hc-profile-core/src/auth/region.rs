use std::fmt;
use std::str::FromStr;

use crate::error::ProfileError;

/// Account region. Exactly one is active per authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Eu,
    Na,
    Cn,
    Ru,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Eu, Region::Na, Region::Cn, Region::Ru];

    pub fn code(&self) -> &'static str {
        match self {
            Region::Eu => "EU",
            Region::Na => "NA",
            Region::Cn => "CN",
            Region::Ru => "RU",
        }
    }

    pub fn endpoints(&self) -> RegionEndpoints {
        let (auth_base_url, asset_base_url) = match self {
            Region::Eu => (
                "https://api.home-connect.com",
                "https://prod.reu.rest.homeconnectegw.com",
            ),
            Region::Na => (
                "https://api-rna.home-connect.com",
                "https://prod.rna.rest.homeconnectegw.com",
            ),
            Region::Cn => (
                "https://api.home-connect.cn",
                "https://prod.rgc.rest.homeconnectegw.cn",
            ),
            Region::Ru => (
                "https://api-rus.home-connect.com",
                "https://prod.rus.rest.homeconnectegw.com",
            ),
        };
        RegionEndpoints::new(auth_base_url, asset_base_url)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| ProfileError::Configuration(format!("Invalid region! {s}")))
    }
}

/// Base URLs of one region, plus the concrete endpoints derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEndpoints {
    pub auth_base_url: String,
    pub asset_base_url: String,
}

impl RegionEndpoints {
    pub fn new(auth_base_url: impl Into<String>, asset_base_url: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into().trim_end_matches('/').to_string(),
            asset_base_url: asset_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/security/oauth/authorize", self.auth_base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/security/oauth/token", self.auth_base_url)
    }

    pub fn account_details_url(&self) -> String {
        format!("{}/account/details", self.asset_base_url)
    }

    /// Prefix to which an appliance identifier is appended to fetch its asset zip.
    pub fn asset_url_prefix(&self) -> String {
        format!("{}/api/iddf/v1/iddf/", self.asset_base_url)
    }
}
