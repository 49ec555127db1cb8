//! Output artifacts.
//!
//! Two shapes exist, picked by [`OutputTarget`]:
//! - a profile archive per appliance: the original asset zip plus a
//!   `<haId>.json` [`Profile`] entry,
//! - one aggregated JSON document holding a [`DeviceConfig`] per appliance.
//!
//! File names are relied upon by downstream tooling and must not change.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::archive::ApplianceArchive;
use crate::contract::{ApplianceRecord, Credential};
use crate::error::ProfileError;
use crate::features::{
    DeviceDescription, FeatureEntry, ResolvedAppliance, DEVICE_DESCRIPTION_SUFFIX,
    FEATURE_MAPPING_SUFFIX,
};

/// Downstream tool the artifacts are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    HomeConnectDirect,
    HomeConnectLocalHass,
    Hcpy,
}

/// Artifact shape of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    ProfileArchive { prefix: &'static str },
    DeviceConfig { tool_name: &'static str },
}

impl OutputTarget {
    pub const ALL: [OutputTarget; 3] = [
        OutputTarget::HomeConnectDirect,
        OutputTarget::HomeConnectLocalHass,
        OutputTarget::Hcpy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::HomeConnectDirect => "homeconnectdirect",
            OutputTarget::HomeConnectLocalHass => "homeconnect-local-hass",
            OutputTarget::Hcpy => "hcpy",
        }
    }

    pub fn mode(&self) -> OutputMode {
        match self {
            OutputTarget::HomeConnectDirect | OutputTarget::HomeConnectLocalHass => {
                OutputMode::ProfileArchive {
                    prefix: self.as_str(),
                }
            }
            OutputTarget::Hcpy => OutputMode::DeviceConfig {
                tool_name: self.as_str(),
            },
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputTarget {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProfileError::Configuration(format!("Invalid target! {s}")))
    }
}

/// Descriptor injected as `<haId>.json` into a profile archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub ha_id: String,
    #[serde(rename = "type")]
    pub appliance_type: String,
    pub serial_number: String,
    pub brand: String,
    pub vib: String,
    pub mac: String,
    pub feature_mapping_file_name: String,
    pub device_description_file_name: String,
    /// RFC 3339 with nanosecond precision and local offset.
    pub created: String,
    #[serde(flatten)]
    pub credential: Credential,
}

impl Profile {
    pub fn new(appliance: &ApplianceRecord, created: DateTime<Local>) -> Self {
        Self {
            ha_id: appliance.identifier.clone(),
            appliance_type: appliance.appliance_type.clone(),
            serial_number: appliance.serial_number.clone(),
            brand: appliance.brand.clone(),
            vib: appliance.vib.clone(),
            mac: appliance.mac.clone(),
            feature_mapping_file_name: format!("{}{FEATURE_MAPPING_SUFFIX}", appliance.identifier),
            device_description_file_name: format!(
                "{}{DEVICE_DESCRIPTION_SUFFIX}",
                appliance.identifier
            ),
            created: created.to_rfc3339_opts(SecondsFormat::Nanos, false),
            credential: appliance.credential.clone(),
        }
    }

    pub fn entry_name(&self) -> String {
        format!("{}.json", self.ha_id)
    }
}

/// One element of the aggregated device configuration document.
///
/// Field order is the serialized key order: `name`, `key`, then `iv` (AES) or
/// `host` (TLS), then `description` and `features` when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceConfig {
    pub name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<DeviceDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<u32, FeatureEntry>>,
}

impl DeviceConfig {
    pub fn new(appliance: &ApplianceRecord, resolved: Option<ResolvedAppliance>) -> Self {
        let (key, iv, host) = match &appliance.credential {
            Credential::Tls { key } => (
                key.clone(),
                None,
                Some(format!(
                    "{}-{}-{}",
                    appliance.brand, appliance.appliance_type, appliance.identifier
                )),
            ),
            Credential::Aes { key, iv } => (key.clone(), Some(iv.clone()), None),
        };
        let (description, features) = match resolved {
            Some(r) => (Some(r.description), Some(r.features)),
            None => (None, None),
        };
        Self {
            name: appliance.appliance_type.to_lowercase(),
            key,
            iv,
            host,
            description,
            features,
        }
    }
}

/// `FridgeFreezer` -> `fridge-freezer`
pub fn kebab_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut previous: Option<char> = None;
    for c in value.chars() {
        if c.is_ascii_uppercase() && previous.is_some_and(|p| p.is_ascii_lowercase()) {
            out.push('-');
        }
        out.push(c);
        previous = Some(c);
    }
    out.to_lowercase()
}

fn file_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<prefix>-<type>-<brand>-<vib>-<mac>_<timestamp>.zip`, lowercase.
pub fn profile_archive_file_name(
    prefix: &str,
    appliance: &ApplianceRecord,
    at: &DateTime<Local>,
) -> String {
    format!(
        "{prefix}-{}-{}-{}-{}_{}.zip",
        kebab_case(&appliance.appliance_type),
        appliance.brand,
        appliance.vib,
        appliance.mac.replace('-', ""),
        file_timestamp(at)
    )
    .to_lowercase()
}

/// `<tool>-devices_<timestamp>.json`
pub fn device_config_file_name(tool_name: &str, at: &DateTime<Local>) -> String {
    format!("{tool_name}-devices_{}.json", file_timestamp(at))
}

/// Add the profile descriptor to the appliance archive and write it to
/// `output_dir`. Returns the written path.
pub async fn write_profile_archive(
    output_dir: &Path,
    prefix: &str,
    appliance: &ApplianceRecord,
    mut archive: ApplianceArchive,
    now: DateTime<Local>,
) -> Result<PathBuf, ProfileError> {
    let profile = Profile::new(appliance, now);
    let json = serde_json::to_vec_pretty(&profile)
        .map_err(|source| ProfileError::Serialization {
            what: "profile",
            source,
        })?;
    archive.insert(profile.entry_name(), json);
    let bytes = archive.to_bytes()?;

    ensure_dir(output_dir).await?;
    let path = output_dir.join(profile_archive_file_name(prefix, appliance, &now));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ProfileError::io(&path, e))?;
    info!(appliance_id = %appliance.identifier, path = %path.display(), "Profile archive written");
    Ok(path)
}

/// Serialize all device configs as one JSON array into `output_dir`.
pub async fn write_device_configs(
    output_dir: &Path,
    tool_name: &str,
    configs: &[DeviceConfig],
    now: DateTime<Local>,
) -> Result<PathBuf, ProfileError> {
    let json = serde_json::to_vec_pretty(configs)
        .map_err(|source| ProfileError::Serialization {
            what: "device configuration",
            source,
        })?;

    ensure_dir(output_dir).await?;
    let path = output_dir.join(device_config_file_name(tool_name, &now));
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| ProfileError::io(&path, e))?;
    info!(devices = configs.len(), path = %path.display(), "Device configuration written");
    Ok(path)
}

async fn ensure_dir(dir: &Path) -> Result<(), ProfileError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ProfileError::io(dir, e))
}
