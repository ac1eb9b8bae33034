use std::fs;

use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::group::Group;
use crate::models::message::Message;
use crate::models::plugin_metadata::PluginMetadata;
use crate::services::condition::parser as condition_parser;

/// An unordered collection of plugin metadata entries plus global messages,
/// known Bash Tag names, and group declarations, loaded from and saved to
/// the YAML document format.
///
/// Plugin entries are keyed by lowercased filename; lookup is therefore
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataList {
    plugins: IndexMap<String, PluginMetadata>,
    messages: Vec<Message>,
    bash_tags: IndexSet<String>,
    groups: Vec<Group>,
}

/// On-disk document schema. Unknown top-level keys are rejected.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MetadataDocument {
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    bash_tags: IndexSet<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    globals: Vec<Message>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    plugins: Vec<PluginMetadata>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<Group>,
}

impl MetadataList {
    pub fn new() -> Self {
        MetadataList::default()
    }

    /// Load a metadata document. Fails with `FileAccess` when the path is
    /// missing or unparseable, and with `ConditionSyntax` when any entry
    /// carries a condition string that does not parse: a malformed entry
    /// never silently disables itself.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        let list = Self::from_str(&text)
            .map_err(|e| match e {
                Error::FileAccess(reason) => Error::FileAccess(format!("{path}: {reason}")),
                other => other,
            })?;
        tracing::info!(
            "Loaded metadata list from {} ({} plugin entries)",
            path,
            list.plugins.len()
        );
        Ok(list)
    }

    /// Parse a metadata document from text.
    pub fn from_str(text: &str) -> Result<Self> {
        let document: MetadataDocument = serde_yaml_ng::from_str(text)
            .map_err(|e| Error::FileAccess(format!("failed to parse metadata document: {e}")))?;

        let mut list = MetadataList {
            plugins: IndexMap::new(),
            messages: document.globals,
            bash_tags: document.bash_tags,
            groups: document.groups,
        };
        for entry in document.plugins {
            list.add_plugin(entry);
        }
        list.validate_conditions()?;
        Ok(list)
    }

    /// Write the document form. Entries that carry nothing besides their
    /// name are suppressed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let document = MetadataDocument {
            bash_tags: self.bash_tags.clone(),
            globals: self.messages.clone(),
            plugins: self
                .plugins
                .values()
                .filter(|p| !p.has_name_only())
                .cloned()
                .collect(),
            groups: self.groups.clone(),
        };
        let text = serde_yaml_ng::to_string(&document)
            .map_err(|e| Error::FileAccess(format!("failed to serialise metadata list: {e}")))?;
        fs::write(path, text).map_err(|e| Error::io(path, &e))?;
        tracing::info!("Saved metadata list to {}", path);
        Ok(())
    }

    /// Look up the entry for a plugin name, case-insensitively.
    pub fn find_plugin(&self, name: &str) -> Option<&PluginMetadata> {
        self.plugins.get(&name.to_lowercase())
    }

    /// Insert an entry. An entry for the same name merges into the existing
    /// one.
    pub fn add_plugin(&mut self, metadata: PluginMetadata) {
        match self.plugins.get_mut(&metadata.key()) {
            Some(existing) => existing.merge(&metadata),
            None => {
                self.plugins.insert(metadata.key(), metadata);
            }
        }
    }

    /// Remove the entry for a plugin name, if any.
    pub fn erase_plugin(&mut self, name: &str) {
        self.plugins.shift_remove(&name.to_lowercase());
    }

    /// Drop every plugin entry, message, tag name and group.
    pub fn clear(&mut self) {
        self.plugins.clear();
        self.messages.clear();
        self.bash_tags.clear();
        self.groups.clear();
    }

    pub fn plugins(&self) -> impl Iterator<Item = &PluginMetadata> {
        self.plugins.values()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn bash_tags(&self) -> &IndexSet<String> {
        &self.bash_tags
    }

    pub fn set_bash_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bash_tags = tags.into_iter().map(Into::into).collect();
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
    }

    fn validate_conditions(&self) -> Result<()> {
        for message in &self.messages {
            if let Some(condition) = message.condition.as_deref() {
                condition_parser::validate(condition)?;
            }
        }
        for plugin in self.plugins.values() {
            for condition in plugin.conditions() {
                condition_parser::validate(condition)?;
            }
        }
        Ok(())
    }
}
