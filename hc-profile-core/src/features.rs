//! Feature resolution for one appliance.
//!
//! Two documents ship in every asset zip:
//! - `*_FeatureMapping.xml` names every feature uid and defines enumerations.
//! - `*_DeviceDescription.xml` describes the appliance and lists where each
//!   feature occurs (status, settings, commands, programs, ...), with access
//!   rights, ranges and the enumeration a value is drawn from.
//!
//! [`resolve`] merges both into one map keyed by uid. Numeric bases differ per
//! field: uids, enumeration ids and `enumerationType` are hexadecimal, enum
//! member values (`refValue`) are decimal.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::archive::ApplianceArchive;
use crate::error::ProfileError;
use crate::xml::{parse_document, XmlNode};

pub const DEVICE_DESCRIPTION_SUFFIX: &str = "_DeviceDescription.xml";
pub const FEATURE_MAPPING_SUFFIX: &str = "_FeatureMapping.xml";

/// Nodes at this depth or shallower never contribute attributes. Direct
/// children of the device root are list containers whose uids repeat the ones
/// found, with richer attributes, on their members.
const SUMMARY_DEPTH: usize = 1;

const PAIRABLE_DEVICE_TYPES: &str = "pairableDeviceTypes";

/// Attributes never copied into [`FeatureEntry::attributes`]. `name` and
/// `values` are serialized next to the flattened attributes and would clash.
const SKIPPED_ATTRIBUTES: [&str; 4] = ["uid", "enumerationType", "name", "values"];

/// One enumeration from the feature mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumEntry {
    #[serde(skip)]
    pub id: u32,
    pub name: String,
    pub values: BTreeMap<i64, String>,
}

/// A feature with everything known about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureEntry {
    #[serde(skip)]
    pub uid: u32,
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<i64, String>>,
}

/// Scalar fields of the `description` element.
pub type DeviceDescription = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMapping {
    pub features: BTreeMap<u32, FeatureEntry>,
    pub enums: BTreeMap<u32, EnumEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedAppliance {
    pub features: BTreeMap<u32, FeatureEntry>,
    pub description: DeviceDescription,
}

/// Resolve the XML documents inside an asset archive.
///
/// Returns `Ok(None)` when either document is absent; that is not an error.
pub fn resolve_archive(archive: &ApplianceArchive) -> Result<Option<ResolvedAppliance>, ProfileError> {
    let description = archive.find_by_suffix(DEVICE_DESCRIPTION_SUFFIX);
    let mapping = archive.find_by_suffix(FEATURE_MAPPING_SUFFIX);
    let ((description_name, description), (mapping_name, mapping)) = match (description, mapping) {
        (Some(d), Some(m)) => (d, m),
        _ => {
            debug!(
                entries = ?archive.entry_names().collect::<Vec<_>>(),
                "Archive lacks device description or feature mapping"
            );
            return Ok(None);
        }
    };
    debug!(description = description_name, mapping = mapping_name, "Resolving features");
    let description = utf8(description_name, description)?;
    let mapping = utf8(mapping_name, mapping)?;
    resolve(description, mapping).map(Some)
}

/// Merge a device description with its feature mapping.
pub fn resolve(
    device_description_xml: &str,
    feature_mapping_xml: &str,
) -> Result<ResolvedAppliance, ProfileError> {
    let mapping = parse_feature_mapping(feature_mapping_xml)?;
    let device = parse_document(device_description_xml)?;

    let mut features = mapping.features;
    merge_occurrences(&device, 0, &mapping.enums, &mut features)?;

    Ok(ResolvedAppliance {
        features,
        description: extract_description(&device),
    })
}

pub fn parse_feature_mapping(xml: &str) -> Result<FeatureMapping, ProfileError> {
    let root = parse_document(xml)?;
    let mut mapping = FeatureMapping::default();

    for section in root.children_named("featureDescription") {
        for feature in section.children_named("feature") {
            let uid = parse_hex(required(feature, "refUID")?)?;
            mapping.features.insert(
                uid,
                FeatureEntry {
                    uid,
                    name: feature.text().to_string(),
                    ..FeatureEntry::default()
                },
            );
        }
    }

    for section in root.children_named("enumDescriptionList") {
        for description in section.children_named("enumDescription") {
            let id = parse_hex(required(description, "refENID")?)?;
            let mut values = BTreeMap::new();
            for member in description.children_named("enumMember") {
                let value = parse_decimal(required(member, "refValue")?)?;
                values.insert(value, member.text().to_string());
            }
            mapping.enums.insert(
                id,
                EnumEntry {
                    id,
                    name: description.attribute("enumKey").unwrap_or_default().to_string(),
                    values,
                },
            );
        }
    }

    debug!(
        features = mapping.features.len(),
        enums = mapping.enums.len(),
        "Parsed feature mapping"
    );
    Ok(mapping)
}

/// Walk the device tree and fold every uid occurrence below the summary depth
/// into `features`. Merging is additive: attributes seen at one occurrence
/// survive later occurrences of the same uid unless overwritten by name.
fn merge_occurrences(
    node: &XmlNode,
    depth: usize,
    enums: &BTreeMap<u32, EnumEntry>,
    features: &mut BTreeMap<u32, FeatureEntry>,
) -> Result<(), ProfileError> {
    if depth > SUMMARY_DEPTH {
        if let Some(raw_uid) = node.attribute("uid") {
            let uid = parse_hex(raw_uid)?;
            match features.get_mut(&uid) {
                Some(entry) => merge_node(node, entry, enums)?,
                None => debug!(uid, element = %node.name, "uid not in feature mapping"),
            }
        }
    }
    for child in &node.children {
        merge_occurrences(child, depth + 1, enums, features)?;
    }
    Ok(())
}

fn merge_node(
    node: &XmlNode,
    entry: &mut FeatureEntry,
    enums: &BTreeMap<u32, EnumEntry>,
) -> Result<(), ProfileError> {
    for (key, value) in &node.attributes {
        if SKIPPED_ATTRIBUTES.contains(&key.as_str()) {
            continue;
        }
        entry.attributes.insert(key.clone(), value.clone());
    }
    if let Some(raw) = node.attribute("enumerationType") {
        let enum_id = parse_hex(raw)?;
        match enums.get(&enum_id) {
            Some(table) => entry.values = Some(table.values.clone()),
            None => warn!(uid = entry.uid, enum_id, "enumeration not in feature mapping"),
        }
    }
    Ok(())
}

/// Copy the `description` element's fields, except the pairable device types list.
pub fn extract_description(device: &XmlNode) -> DeviceDescription {
    device
        .child("description")
        .map(|description| {
            description
                .children
                .iter()
                .filter(|field| field.name != PAIRABLE_DEVICE_TYPES)
                .map(|field| (field.name.clone(), field.text().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn required<'a>(node: &'a XmlNode, attribute: &str) -> Result<&'a str, ProfileError> {
    node.attribute(attribute).ok_or_else(|| {
        ProfileError::XmlFormat(format!("<{}> without {attribute} attribute", node.name))
    })
}

fn parse_hex(raw: &str) -> Result<u32, ProfileError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16)
        .map_err(|e| ProfileError::XmlFormat(format!("invalid hexadecimal id {raw:?}: {e}")))
}

fn parse_decimal(raw: &str) -> Result<i64, ProfileError> {
    raw.trim()
        .parse()
        .map_err(|e| ProfileError::XmlFormat(format!("invalid decimal value {raw:?}: {e}")))
}

fn utf8<'a>(name: &str, bytes: &'a [u8]) -> Result<&'a str, ProfileError> {
    std::str::from_utf8(bytes).map_err(|e| ProfileError::XmlFormat(format!("{name}: {e}")))
}
