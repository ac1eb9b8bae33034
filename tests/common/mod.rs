#![allow(dead_code)]

//! Shared fake collaborators for the integration tests.

use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use plugsort::{
    Error, Game, GameId, LoadOrderHandler, PluginInspector, PluginRecord, Result, VcsClient,
};

/// An inspector that serves plugin records from memory, keyed by filename.
pub struct FakeInspector {
    records: HashMap<String, PluginRecord>,
    executable_version: Option<String>,
}

impl FakeInspector {
    pub fn new() -> Self {
        FakeInspector {
            records: HashMap::new(),
            executable_version: None,
        }
    }

    pub fn with_plugin(mut self, name: &str, record: PluginRecord) -> Self {
        self.records.insert(name.to_lowercase(), record);
        self
    }

    pub fn with_executable_version(mut self, version: &str) -> Self {
        self.executable_version = Some(version.to_string());
        self
    }
}

impl PluginInspector for FakeInspector {
    fn inspect(&self, path: &Utf8Path) -> Result<PluginRecord> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::FileAccess(format!("not a file path: {path}")))?;
        self.records
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::FileAccess(format!("no such plugin: {path}")))
    }

    fn file_version(&self, _path: &Utf8Path) -> Result<Option<String>> {
        Ok(self.executable_version.clone())
    }
}

/// A load order handler backed by plain vectors.
pub struct FakeLoadOrder {
    order: Vec<String>,
    active: Vec<String>,
}

impl FakeLoadOrder {
    pub fn new(order: &[&str], active: &[&str]) -> Self {
        FakeLoadOrder {
            order: order.iter().map(|s| s.to_string()).collect(),
            active: active.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn empty() -> Self {
        FakeLoadOrder::new(&[], &[])
    }
}

impl LoadOrderHandler for FakeLoadOrder {
    fn load_order(&self) -> Vec<String> {
        self.order.clone()
    }

    fn is_active(&self, plugin: &str) -> bool {
        self.active.iter().any(|p| p.eq_ignore_ascii_case(plugin))
    }

    fn set_load_order(&mut self, order: &[String]) -> Result<()> {
        self.order = order.to_vec();
        Ok(())
    }
}

/// A VCS client that "fetches" by writing a fixed document to disk.
pub struct FakeVcs {
    pub fetched_content: Option<String>,
    pub changed: bool,
}

impl VcsClient for FakeVcs {
    fn update(&self, local_path: &Utf8Path, _remote_url: &str, _branch: &str) -> Result<bool> {
        if let Some(content) = &self.fetched_content {
            fs::write(local_path, content)
                .map_err(|e| Error::FileAccess(format!("{local_path}: {e}")))?;
        }
        Ok(self.changed)
    }

    fn revision(&self, _local_path: &Utf8Path, short_id: bool) -> Result<(String, String)> {
        let id = if short_id { "f0e1d2c" } else { "f0e1d2c3b4a59687" };
        Ok((id.to_string(), "2024-06-15".to_string()))
    }

    fn is_latest(&self, _local_path: &Utf8Path, _branch: &str) -> Result<bool> {
        Ok(!self.changed)
    }
}

/// A plugin record builder for tests.
pub fn record(is_master: bool, masters: &[&str]) -> PluginRecord {
    PluginRecord {
        masters: masters.iter().map(|s| s.to_string()).collect(),
        is_master,
        is_light: false,
        is_empty: false,
        form_ids: Vec::new(),
        crc: 0,
        description: None,
    }
}

pub fn record_with_version(is_master: bool, masters: &[&str], version: &str) -> PluginRecord {
    PluginRecord {
        description: Some(format!("Version: {version}")),
        ..record(is_master, masters)
    }
}

/// Build a game over in-memory plugins with no masterlist or userlist
/// loaded. `data_path` need not exist unless conditions touch the disk.
pub fn build_game(
    data_path: &Utf8Path,
    plugins: Vec<(&str, PluginRecord)>,
    order: &[&str],
    active: &[&str],
) -> Game {
    let mut inspector = FakeInspector::new();
    for (name, rec) in &plugins {
        inspector = inspector.with_plugin(name, rec.clone());
    }
    let mut game = Game::new(
        GameId::SkyrimSE,
        data_path.to_path_buf(),
        Box::new(inspector),
        Box::new(FakeLoadOrder::new(order, active)),
        Box::new(FakeVcs {
            fetched_content: None,
            changed: false,
        }),
    );
    let names: Vec<&str> = plugins.iter().map(|(name, _)| *name).collect();
    game.load_plugins(&names).expect("plugins load");
    game
}

/// Write a metadata document into a directory and return its path.
pub fn write_list(dir: &Utf8Path, file_name: &str, text: &str) -> Utf8PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, text).expect("write metadata document");
    path
}

pub fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir")
}
