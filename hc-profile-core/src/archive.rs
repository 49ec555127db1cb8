//! In-memory view of an appliance asset zip.
//!
//! The archive is fully decompressed on load; entries can be read by name or
//! filename suffix, added or overwritten, and the whole set serialized back to
//! a zip.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ProfileError;

/// Upper bound for pre-allocating an entry buffer. The declared size comes
/// from the payload and is only a hint.
const MAX_ENTRY_PREALLOC: u64 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
}

/// Entries keep their original order; inserted entries go to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplianceArchive {
    entries: Vec<ArchiveEntry>,
}

impl ApplianceArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a zip payload. Directory entries are dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProfileError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ProfileError::ArchiveFormat(e.to_string()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| ProfileError::ArchiveFormat(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let capacity = file.size().min(MAX_ENTRY_PREALLOC).min(bytes.len() as u64);
            let mut data = Vec::with_capacity(capacity as usize);
            file.read_to_end(&mut data)
                .map_err(|e| ProfileError::ArchiveFormat(format!("{name}: {e}")))?;
            entries.push(ArchiveEntry { name, data });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// First entry whose name ends with `suffix`.
    pub fn find_by_suffix(&self, suffix: &str) -> Option<(&str, &[u8])> {
        self.entries
            .iter()
            .find(|e| e.name.ends_with(suffix))
            .map(|e| (e.name.as_str(), e.data.as_slice()))
    }

    /// Add an entry, replacing any existing entry with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => existing.data = data,
            None => self.entries.push(ArchiveEntry { name, data }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProfileError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &self.entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| ProfileError::ArchiveFormat(format!("{}: {e}", entry.name)))?;
            writer
                .write_all(&entry.data)
                .map_err(|e| ProfileError::ArchiveFormat(format!("{}: {e}", entry.name)))?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| ProfileError::ArchiveFormat(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ApplianceArchive {
        let mut archive = ApplianceArchive::new();
        archive.insert("SIEMENS-WM14-1_DeviceDescription.xml", b"<device/>".to_vec());
        archive.insert("SIEMENS-WM14-1_FeatureMapping.xml", b"<featureMappingFile/>".to_vec());
        archive
    }

    #[test]
    fn serialized_archive_loads_back() {
        let bytes = sample().to_bytes().unwrap();
        let loaded = ApplianceArchive::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(
            loaded.entry_names().collect::<Vec<_>>(),
            vec![
                "SIEMENS-WM14-1_DeviceDescription.xml",
                "SIEMENS-WM14-1_FeatureMapping.xml"
            ]
        );
    }

    #[test]
    fn lookup_by_suffix() {
        let archive = sample();
        let (name, data) = archive.find_by_suffix("_FeatureMapping.xml").unwrap();
        assert_eq!(name, "SIEMENS-WM14-1_FeatureMapping.xml");
        assert_eq!(data, b"<featureMappingFile/>");
        assert!(archive.find_by_suffix("_Missing.xml").is_none());
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut archive = sample();
        archive.insert("SIEMENS-WM14-1_DeviceDescription.xml", b"<device>2</device>".to_vec());
        assert_eq!(archive.len(), 2);
        assert_eq!(
            archive.entry("SIEMENS-WM14-1_DeviceDescription.xml"),
            Some(&b"<device>2</device>"[..])
        );
    }

    #[test]
    fn rejects_non_zip_payload() {
        let err = ApplianceArchive::from_bytes(b"<html>Service unavailable</html>").unwrap_err();
        assert!(matches!(err, ProfileError::ArchiveFormat(_)));
    }

    /// One stored entry `a.txt` = "hello" whose central directory record
    /// declares, via a zip64 extra field, the given uncompressed size.
    fn zip_declaring_size(uncompressed: u64) -> Vec<u8> {
        const CRC_HELLO: u32 = 0x3610_a686;
        let name = b"a.txt";
        let data = b"hello";
        let mut out = Vec::new();

        // local file header
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes()); // time
        out.extend_from_slice(&0u16.to_le_bytes()); // date
        out.extend_from_slice(&CRC_HELLO.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(data);

        // central directory
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes()); // made by
        out.extend_from_slice(&45u16.to_le_bytes()); // needed
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&CRC_HELLO.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes()); // size in zip64 extra
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&12u16.to_le_bytes()); // extra length
        out.extend_from_slice(&0u16.to_le_bytes()); // comment length
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
        out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
        out.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        out.extend_from_slice(name);
        out.extend_from_slice(&0x0001u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&uncompressed.to_le_bytes());
        let cd_size = out.len() as u32 - cd_offset;

        // end of central directory
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn declared_entry_size_is_only_a_hint() {
        let loaded = ApplianceArchive::from_bytes(&zip_declaring_size(5)).unwrap();
        assert_eq!(loaded.entry("a.txt"), Some(&b"hello"[..]));

        // must not try to allocate u64::MAX bytes
        match ApplianceArchive::from_bytes(&zip_declaring_size(u64::MAX)) {
            Ok(archive) => assert_eq!(archive.entry("a.txt"), Some(&b"hello"[..])),
            Err(e) => assert!(matches!(e, ProfileError::ArchiveFormat(_)), "{e:?}"),
        }
    }

    #[test]
    fn empty_archive_round_trips() {
        let bytes = ApplianceArchive::new().to_bytes().unwrap();
        assert!(ApplianceArchive::from_bytes(&bytes).unwrap().is_empty());
    }
}
