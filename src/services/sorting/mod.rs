//! The load order sorter.
//!
//! Builds a directed graph over the installed plugins from the hard-coded
//! partition rules, the metadata-declared relationships, group membership,
//! and priority comparisons, then emits a stable topological order. The
//! permutation is fully determined by the installed set, header masters,
//! merged metadata, group DAG, current load order, priorities, and names:
//! two runs over identical inputs produce identical output.

mod graph;

pub use graph::EdgeType;

use crate::error::Result;
use crate::models::{Group, Priority};
use graph::PluginGraph;

/// Per-plugin input to the sorter, assembled by the game handle from the
/// cached plugin views and the merged metadata.
#[derive(Debug, Clone)]
pub(crate) struct SortEntry {
    pub name: String,
    /// Effective partition flag: the master header flag, with light
    /// plugins counting as non-masters.
    pub is_master: bool,
    pub masters: Vec<String>,
    pub load_after: Vec<String>,
    pub requirements: Vec<String>,
    pub group: Option<String>,
    pub priority: Priority,
    pub global_priority: Priority,
    /// Position in the current load order; plugins not present sort after
    /// all present ones.
    pub load_order_index: usize,
}

impl SortEntry {
    #[cfg(test)]
    fn new(name: &str, is_master: bool) -> Self {
        SortEntry {
            name: name.to_string(),
            is_master,
            masters: Vec::new(),
            load_after: Vec::new(),
            requirements: Vec::new(),
            group: None,
            priority: Priority::unset(),
            global_priority: Priority::unset(),
            load_order_index: usize::MAX,
        }
    }
}

/// Sort the given plugins. `entries` must already be ordered by current
/// load order position (ties broken by name); the result is a permutation
/// of the entry names.
pub(crate) fn sort(entries: Vec<SortEntry>, groups: &[Group]) -> Result<Vec<String>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut graph = PluginGraph::new(entries);
    graph.add_hard_edges();
    graph.check_for_cycles()?;
    graph.add_group_edges(groups)?;
    graph.add_tie_break_edges();
    Ok(graph.topological_order())
}
