use std::collections::HashSet;

use crate::game::PluginRecord;
use crate::version;

/// An immutable in-memory projection of one plugin file, keyed by
/// case-insensitive filename. Created when the cache loads the file and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PluginView {
    name: String,
    is_master: bool,
    is_light: bool,
    is_empty: bool,
    masters: Vec<String>,
    form_ids: HashSet<u32>,
    crc: u32,
    version: Option<String>,
}

impl PluginView {
    /// Build a view from the data the inspection library returned for a
    /// file. The version string is parsed out of the description field on
    /// a best-effort basis.
    pub fn from_record(name: impl Into<String>, record: PluginRecord) -> Self {
        let version = record
            .description
            .as_deref()
            .and_then(version::extract_version);
        PluginView {
            name: name.into(),
            is_master: record.is_master,
            is_light: record.is_light,
            is_empty: record.is_empty,
            masters: record.masters,
            form_ids: record.form_ids.into_iter().collect(),
            crc: record.crc,
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// The master header flag, as written in the file.
    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// The game-specific light module flag. Light plugins count as
    /// non-masters for the load order partition.
    pub fn is_light(&self) -> bool {
        self.is_light
    }

    /// True when the file holds no records besides its header.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Master filenames as declared in the header, in declaration order.
    pub fn masters(&self) -> &[String] {
        &self.masters
    }

    pub fn has_master(&self, name: &str) -> bool {
        self.masters.iter().any(|m| m.eq_ignore_ascii_case(name))
    }

    pub fn form_ids(&self) -> &HashSet<u32> {
        &self.form_ids
    }

    /// True when the two plugins define or override any common FormID.
    pub fn overlaps_with(&self, other: &PluginView) -> bool {
        let (small, large) = if self.form_ids.len() <= other.form_ids.len() {
            (&self.form_ids, &other.form_ids)
        } else {
            (&other.form_ids, &self.form_ids)
        };
        small.iter().any(|id| large.contains(id))
    }

    /// CRC-32 of the file bytes.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Version parsed from the description field, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
