use serde::{Deserialize, Serialize};

use crate::models::cleaning_data::CleaningData;
use crate::models::file::FileRef;
use crate::models::location::Location;
use crate::models::message::Message;
use crate::models::priority::Priority;
use crate::models::tag::Tag;

/// Everything the metadata lists know about one plugin.
///
/// Serialises to the document form with the short key names (`after`,
/// `req`, `inc`, `msg`, `tag`, `dirty`, `url`); unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default = "default_enabled", skip_serializing_if = "is_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Priority::is_unset")]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Priority::is_unset")]
    pub global_priority: Priority,

    #[serde(rename = "after", default, skip_serializing_if = "Vec::is_empty")]
    pub load_after: Vec<FileRef>,

    #[serde(rename = "req", default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<FileRef>,

    #[serde(rename = "inc", default, skip_serializing_if = "Vec::is_empty")]
    pub incompatibilities: Vec<FileRef>,

    #[serde(rename = "msg", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,

    #[serde(rename = "tag", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(rename = "dirty", default, skip_serializing_if = "Vec::is_empty")]
    pub dirty_info: Vec<CleaningData>,

    #[serde(rename = "url", default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

impl PluginMetadata {
    pub fn new<S: Into<String>>(name: S) -> Self {
        PluginMetadata {
            name: name.into(),
            group: None,
            enabled: true,
            priority: Priority::unset(),
            global_priority: Priority::unset(),
            load_after: Vec::new(),
            requirements: Vec::new(),
            incompatibilities: Vec::new(),
            messages: Vec::new(),
            tags: Vec::new(),
            dirty_info: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// The normalised key this entry is stored under.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// True when the entry carries nothing besides its name. Such entries
    /// are suppressed when a list is written back to disk.
    pub fn has_name_only(&self) -> bool {
        self.group.is_none()
            && self.enabled
            && self.priority.is_unset()
            && self.global_priority.is_unset()
            && self.load_after.is_empty()
            && self.requirements.is_empty()
            && self.incompatibilities.is_empty()
            && self.messages.is_empty()
            && self.tags.is_empty()
            && self.dirty_info.is_empty()
            && self.locations.is_empty()
    }

    /// Merge another entry into this one, applied when composing the
    /// masterlist with the userlist.
    ///
    /// Scalars are overwritten iff the other side carries a set value; a
    /// disabled state always sticks. Set-like fields union with this
    /// entry's elements first; messages concatenate in the same order.
    pub fn merge(&mut self, other: &PluginMetadata) {
        if other.group.is_some() {
            self.group = other.group.clone();
        }
        if !other.enabled {
            self.enabled = false;
        }
        self.priority.merge(other.priority);
        self.global_priority.merge(other.global_priority);

        merge_by_key(&mut self.load_after, &other.load_after, FileRef::key);
        merge_by_key(&mut self.requirements, &other.requirements, FileRef::key);
        merge_by_key(
            &mut self.incompatibilities,
            &other.incompatibilities,
            FileRef::key,
        );
        merge_by_key(&mut self.tags, &other.tags, Tag::key);
        merge_by_key(&mut self.dirty_info, &other.dirty_info, |d| d.crc);
        merge_by_key(&mut self.locations, &other.locations, Location::key);

        self.messages.extend(other.messages.iter().cloned());
    }

    /// All condition strings carried by this entry's sub-values.
    pub(crate) fn conditions(&self) -> impl Iterator<Item = &str> {
        self.load_after
            .iter()
            .chain(&self.requirements)
            .chain(&self.incompatibilities)
            .filter_map(|f| f.condition.as_deref())
            .chain(self.messages.iter().filter_map(|m| m.condition.as_deref()))
            .chain(self.tags.iter().filter_map(|t| t.condition.as_deref()))
    }
}

/// Append elements of `other` whose key is not already present, keeping
/// the existing order.
fn merge_by_key<T, K, F>(existing: &mut Vec<T>, other: &[T], key: F)
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    for item in other {
        let item_key = key(item);
        if !existing.iter().any(|e| key(e) == item_key) {
            existing.push(item.clone());
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn is_enabled(enabled: &bool) -> bool {
    *enabled
}
