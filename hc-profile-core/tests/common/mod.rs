#![allow(dead_code)]

use hc_profile_core::archive::ApplianceArchive;
use hc_profile_core::contract::{ApplianceRecord, Credential};

pub const WASHER_ID: &str = "SIEMENS-WM14T6H9-68A40E000001";
pub const FRIDGE_ID: &str = "BOSCH-KGN39VI45-68A40E000002";

pub const DEVICE_DESCRIPTION: &str =
    include_str!("../fixtures/SIEMENS-WM14T6H9-68A40E000001_DeviceDescription.xml");
pub const FEATURE_MAPPING: &str =
    include_str!("../fixtures/SIEMENS-WM14T6H9-68A40E000001_FeatureMapping.xml");

pub fn washer() -> ApplianceRecord {
    ApplianceRecord {
        identifier: WASHER_ID.to_string(),
        appliance_type: "Washer".to_string(),
        serial_number: "123456789012345678".to_string(),
        brand: "SIEMENS".to_string(),
        vib: "WM14T6H9NL".to_string(),
        mac: "68-A4-0E-00-00-01".to_string(),
        credential: Credential::Aes {
            key: "washer-aes-key".to_string(),
            iv: "washer-aes-iv".to_string(),
        },
    }
}

pub fn fridge() -> ApplianceRecord {
    ApplianceRecord {
        identifier: FRIDGE_ID.to_string(),
        appliance_type: "FridgeFreezer".to_string(),
        serial_number: "998877".to_string(),
        brand: "BOSCH".to_string(),
        vib: "KGN39VI45".to_string(),
        mac: "68-A4-0E-00-00-02".to_string(),
        credential: Credential::Tls {
            key: "fridge-psk".to_string(),
        },
    }
}

/// Asset archive as served by the cloud: both XML documents, named after the appliance.
pub fn asset_archive(appliance_id: &str) -> ApplianceArchive {
    let mut archive = ApplianceArchive::new();
    archive.insert(
        format!("{appliance_id}_DeviceDescription.xml"),
        DEVICE_DESCRIPTION.as_bytes().to_vec(),
    );
    archive.insert(
        format!("{appliance_id}_FeatureMapping.xml"),
        FEATURE_MAPPING.as_bytes().to_vec(),
    );
    archive
}

pub fn asset_zip(appliance_id: &str) -> Vec<u8> {
    asset_archive(appliance_id)
        .to_bytes()
        .expect("fixture archive serializes")
}
