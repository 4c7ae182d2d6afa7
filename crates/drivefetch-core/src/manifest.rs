//! Static mapping of output filenames to remote file ids.

use crate::error::ManifestError;
use std::collections::HashSet;

/// The external data set: an md5 file plus the four parts of `data.tar.gz`.
const EXTERNAL_DATA: [(&str, &str); 5] = [
    ("data.tar.gz.md5", "1jPi1YkQAxGaayKh_8XPmKPaq6HBAr4g6"),
    ("data.tar.gz.part-00", "14WR4RN3ohppYSJ1kpl5H1PCMivyEDGj4"),
    ("data.tar.gz.part-01", "1V1woKtshzi4w4tCEy-R2rvGAizi3woti"),
    ("data.tar.gz.part-02", "1DJOQBu3PqAk4nT6SAuE4PWQE8NmkMYHQ"),
    ("data.tar.gz.part-03", "1sXOKZiv4pZECQRAYiO4k2gjItqcDfrco"),
];

/// One file to download: local name and the provider's opaque id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub output_filename: String,
    pub remote_id: String,
}

impl ResourceEntry {
    pub fn new(output_filename: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self {
            output_filename: output_filename.into(),
            remote_id: remote_id.into(),
        }
    }
}

/// Ordered set of entries with unique output filenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    entries: Vec<ResourceEntry>,
}

impl ResourceMapping {
    /// Builds a mapping, rejecting duplicate or unsafe filenames and empty ids.
    /// Filenames must be plain names: no path separators, not `.` or `..`.
    pub fn new(entries: Vec<ResourceEntry>) -> Result<Self, ManifestError> {
        validate(&entries)?;
        Ok(Self { entries })
    }

    /// The built-in external data set.
    pub fn external_data() -> Self {
        Self {
            entries: EXTERNAL_DATA
                .iter()
                .map(|(name, id)| ResourceEntry::new(*name, *id))
                .collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResourceMapping {
    type Item = &'a ResourceEntry;
    type IntoIter = std::slice::Iter<'a, ResourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate(entries: &[ResourceEntry]) -> Result<(), ManifestError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        let name = entry.output_filename.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(ManifestError::InvalidFilename(name.to_string()));
        }
        if entry.remote_id.trim().is_empty() {
            return Err(ManifestError::EmptyRemoteId(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(ManifestError::DuplicateFilename(name.to_string()));
        }
    }
    Ok(())
}
