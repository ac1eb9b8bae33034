use camino::Utf8Path;

use crate::error::{Error, Result};
use crate::game::VcsClient;
use crate::models::{
    Group, Masterlist, MasterlistInfo, Message, MetadataList, PluginMetadata,
};

/// The query surface over the merged masterlist + userlist metadata.
///
/// The database owns the two parsed lists. Condition evaluation is layered
/// on top by the game handle, which lends its cache to the evaluator for
/// the duration of each query.
#[derive(Debug, Default)]
pub struct Database {
    masterlist: Masterlist,
    userlist: MetadataList,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Load the masterlist and/or userlist. Either path may be absent; a
    /// present path that does not exist on disk is a `FileAccess` error.
    /// Both lists are parsed before either stored list is replaced, so a
    /// failed load leaves the previous state fully in effect.
    pub fn load_lists(
        &mut self,
        masterlist_path: Option<&Utf8Path>,
        userlist_path: Option<&Utf8Path>,
    ) -> Result<()> {
        let masterlist = match masterlist_path {
            Some(path) if !path.as_str().is_empty() => {
                if !path.exists() {
                    return Err(Error::FileAccess(format!(
                        "the given masterlist path does not exist: {path}"
                    )));
                }
                Some(Masterlist::load(path)?)
            }
            _ => None,
        };
        let userlist = match userlist_path {
            Some(path) if !path.as_str().is_empty() => {
                if !path.exists() {
                    return Err(Error::FileAccess(format!(
                        "the given userlist path does not exist: {path}"
                    )));
                }
                Some(MetadataList::load(path)?)
            }
            _ => None,
        };

        self.masterlist = masterlist.unwrap_or_default();
        self.userlist = userlist.unwrap_or_default();
        Ok(())
    }

    /// Write the userlist to `path`. The parent directory must exist, and
    /// an existing file is only clobbered when `overwrite` is set.
    pub fn write_user_metadata(&self, path: &Utf8Path, overwrite: bool) -> Result<()> {
        check_output_path(path, overwrite)?;
        self.userlist.save(path)
    }

    /// Write a minimal list containing only the plugins that carry tag
    /// suggestions or cleaning data, retaining just those two fields.
    pub fn write_minimal_list(&self, path: &Utf8Path, overwrite: bool) -> Result<()> {
        check_output_path(path, overwrite)?;

        let mut minimal = MetadataList::new();
        for plugin in self.masterlist.list().plugins() {
            if plugin.tags.is_empty() && plugin.dirty_info.is_empty() {
                continue;
            }
            let mut entry = PluginMetadata::new(plugin.name.clone());
            entry.tags = plugin.tags.clone();
            entry.dirty_info = plugin.dirty_info.clone();
            minimal.add_plugin(entry);
        }
        minimal.save(path)
    }

    /// Update the on-disk masterlist via the VCS client and swap in the
    /// newly parsed list on change. Returns true iff the file changed. On
    /// failure the previous masterlist stays in effect.
    pub fn update_masterlist(
        &mut self,
        vcs: &dyn VcsClient,
        path: &Utf8Path,
        url: &str,
        branch: &str,
    ) -> Result<bool> {
        match path.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "masterlist path \"{path}\" does not have a valid parent directory"
                )))
            }
        }

        let mut updated = Masterlist::new();
        let changed = updated.update(vcs, path, url, branch)?;
        if changed {
            self.masterlist = updated;
        }
        Ok(changed)
    }

    /// Revision information for an on-disk masterlist.
    pub fn masterlist_revision(
        &self,
        vcs: &dyn VcsClient,
        path: &Utf8Path,
        short_id: bool,
    ) -> Result<MasterlistInfo> {
        Masterlist::info(vcs, path, short_id)
    }

    /// True iff the on-disk masterlist matches the tip of `branch`.
    pub fn is_latest_masterlist(
        &self,
        vcs: &dyn VcsClient,
        path: &Utf8Path,
        branch: &str,
    ) -> Result<bool> {
        Masterlist::is_latest(vcs, path, branch)
    }

    /// Union of the masterlist's and userlist's known Bash Tag names, in
    /// first-seen order.
    pub fn known_bash_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.masterlist.list().bash_tags().iter().cloned().collect();
        for tag in self.userlist.bash_tags() {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Masterlist messages followed by userlist messages, unevaluated.
    pub fn general_messages(&self) -> Vec<Message> {
        let mut messages = self.masterlist.list().messages().to_vec();
        messages.extend(self.userlist.messages().iter().cloned());
        messages
    }

    /// The masterlist entry for a plugin, merged with the userlist entry
    /// when requested. Returns None when neither list has an entry.
    pub fn plugin_metadata(&self, plugin: &str, include_user: bool) -> Option<PluginMetadata> {
        let master_entry = self.masterlist.list().find_plugin(plugin);
        if !include_user {
            return master_entry.cloned();
        }

        let user_entry = self.userlist.find_plugin(plugin);
        match (master_entry, user_entry) {
            (Some(master), Some(user)) => {
                let mut merged = master.clone();
                merged.merge(user);
                Some(merged)
            }
            (Some(master), None) => Some(master.clone()),
            (None, Some(user)) => Some(user.clone()),
            (None, None) => None,
        }
    }

    /// The userlist entry alone.
    pub fn plugin_user_metadata(&self, plugin: &str) -> Option<PluginMetadata> {
        self.userlist.find_plugin(plugin).cloned()
    }

    /// Replace the userlist entry for the plugin. This erases any prior
    /// entry rather than merging into it.
    pub fn set_plugin_user_metadata(&mut self, metadata: PluginMetadata) {
        self.userlist.erase_plugin(&metadata.name);
        self.userlist.add_plugin(metadata);
    }

    pub fn discard_plugin_user_metadata(&mut self, plugin: &str) {
        self.userlist.erase_plugin(plugin);
    }

    pub fn discard_all_user_metadata(&mut self) {
        self.userlist.clear();
    }

    /// The group DAG: masterlist declarations first, with userlist
    /// declarations appended (same-named groups union their `after` sets).
    pub fn merged_groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.masterlist.list().groups().to_vec();
        for group in self.userlist.groups() {
            match groups.iter_mut().find(|g| g.name == group.name) {
                Some(existing) => {
                    for name in &group.after {
                        if !existing.after.contains(name) {
                            existing.after.push(name.clone());
                        }
                    }
                }
                None => groups.push(group.clone()),
            }
        }
        groups
    }

    pub fn masterlist(&self) -> &Masterlist {
        &self.masterlist
    }

    pub fn userlist(&self) -> &MetadataList {
        &self.userlist
    }
}

fn check_output_path(path: &Utf8Path, overwrite: bool) -> Result<()> {
    match path.parent() {
        Some(parent) if parent.as_str().is_empty() || parent.exists() => {}
        _ => return Err(Error::InvalidArgument("output directory does not exist".into())),
    }
    if path.exists() && !overwrite {
        return Err(Error::FileAccess(
            "output file exists but overwrite is not set".into(),
        ));
    }
    Ok(())
}
