//! The game handle and its collaborators.
//!
//! A [`Game`] owns the per-game cache, the metadata database, and boxed
//! implementations of the three external collaborator traits:
//! [`PluginInspector`] (binary plugin parsing), [`LoadOrderHandler`] (the
//! on-disk load order), and [`VcsClient`] (masterlist version control).
//! A handle is not safe for concurrent use from multiple threads; callers
//! serialise their own access.

pub mod cache;
pub mod plugin;

use std::collections::HashMap;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::Result;
use crate::metrics::Metrics;
use crate::models::{MasterlistInfo, Message, PluginMetadata};
use crate::services::condition::ConditionEvaluator;
use crate::services::database::Database;
use crate::services::sorting::{self, SortEntry};

pub use cache::GameCache;
pub use plugin::PluginView;

/// The supported games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameId {
    Oblivion,
    Skyrim,
    SkyrimSE,
    Fallout3,
    FalloutNV,
    Fallout4,
}

impl GameId {
    pub fn name(&self) -> &'static str {
        match self {
            GameId::Oblivion => "Oblivion",
            GameId::Skyrim => "Skyrim",
            GameId::SkyrimSE => "Skyrim Special Edition",
            GameId::Fallout3 => "Fallout 3",
            GameId::FalloutNV => "Fallout: New Vegas",
            GameId::Fallout4 => "Fallout 4",
        }
    }

    /// Whether the game recognises the light module header flag.
    pub fn supports_light_plugins(&self) -> bool {
        matches!(self, GameId::SkyrimSE | GameId::Fallout4)
    }
}

/// The data the plugin inspection library reports for one plugin file.
#[derive(Debug, Clone, Default)]
pub struct PluginRecord {
    pub masters: Vec<String>,
    pub is_master: bool,
    pub is_light: bool,
    pub is_empty: bool,
    pub form_ids: Vec<u32>,
    pub crc: u32,
    pub description: Option<String>,
}

/// Contract of the binary plugin inspection library.
pub trait PluginInspector {
    /// Read a plugin file's header data, FormIDs and CRC.
    fn inspect(&self, path: &Utf8Path) -> Result<PluginRecord>;

    /// Read an executable's embedded version, if it has one.
    fn file_version(&self, path: &Utf8Path) -> Result<Option<String>> {
        let _ = path;
        Ok(None)
    }
}

/// Contract of the load order library for the current game.
pub trait LoadOrderHandler {
    /// The current load order, active plugins and inactive ones alike.
    fn load_order(&self) -> Vec<String>;

    fn is_active(&self, plugin: &str) -> bool;

    /// Persist a new load order.
    fn set_load_order(&mut self, order: &[String]) -> Result<()>;
}

/// Contract of the version control client used for masterlist updates.
pub trait VcsClient {
    /// Bring the local file up to date with the remote branch. Returns
    /// true iff the local contents changed. The file on disk is replaced
    /// only after a fully successful fetch.
    fn update(&self, local_path: &Utf8Path, remote_url: &str, branch: &str) -> Result<bool>;

    /// The (revision id, ISO date) of the local file's checkout.
    fn revision(&self, local_path: &Utf8Path, short_id: bool) -> Result<(String, String)>;

    /// True iff the local file matches the tip of the given remote branch.
    fn is_latest(&self, local_path: &Utf8Path, branch: &str) -> Result<bool>;
}

/// One game instance: the cache, the metadata database, and the external
/// collaborators, wired together behind the operations the host calls.
pub struct Game {
    id: GameId,
    data_path: Utf8PathBuf,
    executable_version: Option<String>,
    cache: GameCache,
    database: Database,
    metrics: Metrics,
    inspector: Box<dyn PluginInspector>,
    load_order: Box<dyn LoadOrderHandler>,
    vcs: Box<dyn VcsClient>,
}

impl Game {
    pub fn new(
        id: GameId,
        data_path: impl Into<Utf8PathBuf>,
        inspector: Box<dyn PluginInspector>,
        load_order: Box<dyn LoadOrderHandler>,
        vcs: Box<dyn VcsClient>,
    ) -> Self {
        Game {
            id,
            data_path: data_path.into(),
            executable_version: None,
            cache: GameCache::new(),
            database: Database::new(),
            metrics: Metrics::new(),
            inspector,
            load_order,
            vcs,
        }
    }

    /// Record the game executable so that `version("", ...)` conditions can
    /// compare against it. Version extraction is best-effort: an
    /// executable without a readable version compares as version zero.
    pub fn set_executable(&mut self, path: &Utf8Path) {
        self.executable_version = self
            .inspector
            .file_version(path)
            .ok()
            .flatten();
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn data_path(&self) -> &Utf8Path {
        &self.data_path
    }

    pub fn cache(&self) -> &GameCache {
        &self.cache
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Load the named plugin files from the data directory into the cache,
    /// replacing any views already cached under the same names.
    pub fn load_plugins<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            let path = self.data_path.join(name);
            let mut record = self.inspector.inspect(&path)?;
            if !self.id.supports_light_plugins() {
                record.is_light = false;
            }
            self.cache.add_plugin(PluginView::from_record(name, record));
            self.metrics.record_plugin_loaded();
        }
        tracing::info!(
            "Loaded {} plugins into the cache ({} total)",
            names.len(),
            self.cache.plugin_count()
        );
        Ok(())
    }

    /// A cached plugin view, loading it on demand if absent.
    pub fn plugin(&mut self, name: &str) -> Result<&PluginView> {
        if self.cache.plugin(name).is_none() {
            self.load_plugins(&[name])?;
        }
        self.cache.plugin(name).ok_or_else(|| {
            crate::error::Error::FileAccess(format!("plugin not loadable: {name}"))
        })
    }

    /// Drop the cached plugin views and condition results.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // ----- database facade -----

    /// Load the masterlist and/or userlist.
    pub fn load_lists(
        &mut self,
        masterlist_path: Option<&Utf8Path>,
        userlist_path: Option<&Utf8Path>,
    ) -> Result<()> {
        self.database.load_lists(masterlist_path, userlist_path)
    }

    /// Update the on-disk masterlist and swap in the parsed result on
    /// change. A swap starts a new condition cache epoch.
    pub fn update_masterlist(&mut self, path: &Utf8Path, url: &str, branch: &str) -> Result<bool> {
        let changed = self
            .database
            .update_masterlist(self.vcs.as_ref(), path, url, branch)?;
        if changed {
            self.cache.clear_cached_conditions();
        }
        Ok(changed)
    }

    pub fn masterlist_revision(&self, path: &Utf8Path, short_id: bool) -> Result<MasterlistInfo> {
        self.database
            .masterlist_revision(self.vcs.as_ref(), path, short_id)
    }

    pub fn is_latest_masterlist(&self, path: &Utf8Path, branch: &str) -> Result<bool> {
        self.database
            .is_latest_masterlist(self.vcs.as_ref(), path, branch)
    }

    pub fn write_user_metadata(&self, path: &Utf8Path, overwrite: bool) -> Result<()> {
        self.database.write_user_metadata(path, overwrite)
    }

    pub fn write_minimal_list(&self, path: &Utf8Path, overwrite: bool) -> Result<()> {
        self.database.write_minimal_list(path, overwrite)
    }

    pub fn known_bash_tags(&self) -> Vec<String> {
        self.database.known_bash_tags()
    }

    /// Masterlist messages followed by userlist messages. When evaluating,
    /// the condition cache is cleared first for a fresh view, then each
    /// message is kept iff its condition holds.
    pub fn general_messages(&mut self, evaluate_conditions: bool) -> Result<Vec<Message>> {
        let messages = self.database.general_messages();
        if !evaluate_conditions {
            return Ok(messages);
        }

        self.cache.clear_cached_conditions();
        let mut evaluator = ConditionEvaluator::new(
            &self.data_path,
            &mut self.cache,
            self.load_order.as_ref(),
            self.executable_version.as_deref(),
            &self.metrics,
        );
        let mut visible = Vec::with_capacity(messages.len());
        for message in messages {
            if evaluator.message_is_visible(&message)? {
                visible.push(message);
            }
        }
        Ok(visible)
    }

    /// The merged metadata for a plugin. With `evaluate_conditions`, every
    /// conditional sub-value is resolved and condition strings are cleared
    /// on the returned copy.
    pub fn plugin_metadata(
        &mut self,
        plugin: &str,
        include_user_metadata: bool,
        evaluate_conditions: bool,
    ) -> Result<Option<PluginMetadata>> {
        let metadata = self.database.plugin_metadata(plugin, include_user_metadata);
        match metadata {
            Some(metadata) if evaluate_conditions => {
                let mut evaluator = ConditionEvaluator::new(
                    &self.data_path,
                    &mut self.cache,
                    self.load_order.as_ref(),
                    self.executable_version.as_deref(),
                    &self.metrics,
                );
                Ok(Some(evaluator.evaluate_all(&metadata)?))
            }
            other => Ok(other),
        }
    }

    /// The userlist entry alone.
    pub fn plugin_user_metadata(
        &mut self,
        plugin: &str,
        evaluate_conditions: bool,
    ) -> Result<Option<PluginMetadata>> {
        let metadata = self.database.plugin_user_metadata(plugin);
        match metadata {
            Some(metadata) if evaluate_conditions => {
                let mut evaluator = ConditionEvaluator::new(
                    &self.data_path,
                    &mut self.cache,
                    self.load_order.as_ref(),
                    self.executable_version.as_deref(),
                    &self.metrics,
                );
                Ok(Some(evaluator.evaluate_all(&metadata)?))
            }
            other => Ok(other),
        }
    }

    pub fn set_plugin_user_metadata(&mut self, metadata: PluginMetadata) {
        self.database.set_plugin_user_metadata(metadata);
    }

    pub fn discard_plugin_user_metadata(&mut self, plugin: &str) {
        self.database.discard_plugin_user_metadata(plugin);
    }

    pub fn discard_all_user_metadata(&mut self) {
        self.database.discard_all_user_metadata();
    }

    // ----- sorting -----

    /// Sort the plugins currently in the cache. The result is a
    /// permutation of the cached plugin names; a failed sort leaves the
    /// cache untouched.
    pub fn sort_plugins(&mut self) -> Result<Vec<String>> {
        let started = Instant::now();

        let current_order = self.load_order.load_order();
        let position: HashMap<String, usize> = current_order
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_lowercase(), index))
            .collect();

        let mut entries: Vec<SortEntry> = Vec::with_capacity(self.cache.plugin_count());
        for view in self.cache.plugins() {
            let metadata = self
                .database
                .plugin_metadata(view.name(), true)
                .unwrap_or_else(|| PluginMetadata::new(view.name()));
            entries.push(SortEntry {
                name: view.name().to_string(),
                is_master: view.is_master() && !view.is_light(),
                masters: view.masters().to_vec(),
                load_after: metadata.load_after.iter().map(|f| f.name.clone()).collect(),
                requirements: metadata
                    .requirements
                    .iter()
                    .map(|f| f.name.clone())
                    .collect(),
                group: metadata.group.clone(),
                priority: metadata.priority,
                global_priority: metadata.global_priority,
                load_order_index: position
                    .get(&view.key())
                    .copied()
                    .unwrap_or(usize::MAX),
            });
        }
        entries.sort_by(|a, b| {
            a.load_order_index
                .cmp(&b.load_order_index)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        let groups = self.database.merged_groups();
        let order = sorting::sort(entries, &groups)?;

        self.metrics.record_sort(started.elapsed());
        tracing::info!(
            "Sorted {} plugins in {:.2}ms",
            order.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(order)
    }

    /// Persist a load order through the load order library.
    pub fn apply_load_order(&mut self, order: &[String]) -> Result<()> {
        self.load_order.set_load_order(order)
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.metrics.log_summary();
    }
}
