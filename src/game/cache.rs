use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use crate::game::plugin::PluginView;

/// Process-local cache owned by one game handle.
///
/// Holds the loaded plugin views, memoised condition results, and file
/// CRCs. Plugin views and condition results are invalidated wholesale by
/// [`GameCache::clear`]; the CRC cache lives for the life of the game
/// handle. Clearing the condition results starts a new cache epoch.
#[derive(Debug, Default)]
pub struct GameCache {
    plugins: IndexMap<String, PluginView>,
    conditions: HashMap<String, bool>,
    crcs: HashMap<Utf8PathBuf, u32>,
}

impl GameCache {
    pub fn new() -> Self {
        GameCache::default()
    }

    /// Store a loaded plugin view. A view with the same name (compared
    /// case-insensitively) is replaced.
    pub fn add_plugin(&mut self, view: PluginView) {
        self.plugins.insert(view.key(), view);
    }

    /// Look up a plugin view, case-insensitively.
    pub fn plugin(&self, name: &str) -> Option<&PluginView> {
        self.plugins.get(&name.to_lowercase())
    }

    pub fn plugins(&self) -> impl Iterator<Item = &PluginView> {
        self.plugins.values()
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn cached_condition(&self, condition: &str) -> Option<bool> {
        self.conditions.get(condition).copied()
    }

    pub fn cache_condition(&mut self, condition: &str, result: bool) {
        self.conditions.insert(condition.to_string(), result);
    }

    /// Start a new condition cache epoch.
    pub fn clear_cached_conditions(&mut self) {
        self.conditions.clear();
    }

    pub fn cached_crc(&self, path: &Utf8Path) -> Option<u32> {
        self.crcs.get(path).copied()
    }

    pub fn cache_crc(&mut self, path: &Utf8Path, crc: u32) {
        self.crcs.insert(path.to_path_buf(), crc);
    }

    /// Drop the plugin views and condition results. The CRC cache is kept:
    /// file contents do not change when the plugin set is reloaded.
    pub fn clear(&mut self) {
        self.plugins.clear();
        self.conditions.clear();
    }
}
