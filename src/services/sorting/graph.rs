use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::{CycleEdge, Error, Result};
use crate::models::Group;
use crate::services::sorting::SortEntry;

/// The rule class that contributed an edge. Cycle reports carry these so
/// the offending rule can be identified per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    MasterFlag,
    HeaderMaster,
    LoadAfter,
    Requirement,
    Group,
    TieBreak,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EdgeType::MasterFlag => "master flag",
            EdgeType::HeaderMaster => "header master",
            EdgeType::LoadAfter => "load after",
            EdgeType::Requirement => "requirement",
            EdgeType::Group => "group",
            EdgeType::TieBreak => "tie-break",
        };
        write!(f, "{text}")
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed graph over the installed plugins. An edge `A -> B` means "A
/// loads before B". The adjacency list is indexed by position in the
/// entry vector so the sort's hot loops never hash plugin names.
pub(crate) struct PluginGraph {
    entries: Vec<SortEntry>,
    index_by_key: HashMap<String, usize>,
    edges: Vec<Vec<(usize, EdgeType)>>,
}

impl PluginGraph {
    pub(crate) fn new(entries: Vec<SortEntry>) -> Self {
        let index_by_key = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.to_lowercase(), i))
            .collect();
        let edges = vec![Vec::new(); entries.len()];
        PluginGraph {
            entries,
            index_by_key,
            edges,
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, edge_type: EdgeType) {
        if from == to {
            return;
        }
        if self.edges[from].iter().any(|(target, _)| *target == to) {
            return;
        }
        self.edges[from].push((to, edge_type));
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        self.index_by_key.get(&name.to_lowercase()).copied()
    }

    /// Rules 1-4: the master/non-master partition, header masters, and the
    /// metadata `load after` and requirement references.
    pub(crate) fn add_hard_edges(&mut self) {
        let count = self.entries.len();

        for master in 0..count {
            if !self.entries[master].is_master {
                continue;
            }
            for other in 0..count {
                if !self.entries[other].is_master {
                    self.add_edge(master, other, EdgeType::MasterFlag);
                }
            }
        }

        for plugin in 0..count {
            for master in self.entries[plugin].masters.clone() {
                if let Some(from) = self.resolve(&master) {
                    self.add_edge(from, plugin, EdgeType::HeaderMaster);
                }
            }
            for name in self.entries[plugin].load_after.clone() {
                if let Some(from) = self.resolve(&name) {
                    self.add_edge(from, plugin, EdgeType::LoadAfter);
                }
            }
            for name in self.entries[plugin].requirements.clone() {
                if let Some(from) = self.resolve(&name) {
                    self.add_edge(from, plugin, EdgeType::Requirement);
                }
            }
        }
    }

    /// Depth-first cycle check over the current edge set. The reported
    /// cycle names every plugin in it together with the rule that
    /// contributed the edge leaving it.
    pub(crate) fn check_for_cycles(&self) -> Result<()> {
        let mut colors = vec![Color::White; self.entries.len()];
        let mut path: Vec<(usize, EdgeType)> = Vec::new();

        for start in 0..self.entries.len() {
            if colors[start] == Color::White {
                if let Some(cycle) = self.find_cycle(start, &mut colors, &mut path) {
                    return Err(Error::CyclicInteraction(cycle));
                }
            }
        }
        Ok(())
    }

    fn find_cycle(
        &self,
        vertex: usize,
        colors: &mut [Color],
        path: &mut Vec<(usize, EdgeType)>,
    ) -> Option<Vec<CycleEdge>> {
        colors[vertex] = Color::Gray;

        for &(target, edge_type) in &self.edges[vertex] {
            match colors[target] {
                Color::Gray => {
                    // Walk the stack back to the repeated vertex to collect
                    // the cycle members in order.
                    let mut cycle = Vec::new();
                    let start = path
                        .iter()
                        .position(|(v, _)| *v == target)
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    let mut members: Vec<usize> = vec![target];
                    members.extend(path[start..].iter().map(|(v, _)| *v));

                    // The edge leaving each member is the one entering its
                    // successor; the closing edge leaves the current vertex.
                    let mut leaving: Vec<EdgeType> =
                        path[start..].iter().map(|(_, t)| *t).collect();
                    leaving.push(edge_type);

                    for (member, leaving_type) in members.iter().zip(leaving) {
                        cycle.push(CycleEdge {
                            plugin: self.entries[*member].name.clone(),
                            edge_type: leaving_type,
                        });
                    }
                    return Some(cycle);
                }
                Color::White => {
                    path.push((target, edge_type));
                    if let Some(cycle) = self.find_cycle(target, colors, path) {
                        return Some(cycle);
                    }
                    path.pop();
                }
                Color::Black => {}
            }
        }

        colors[vertex] = Color::Black;
        None
    }

    fn path_exists(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.entries.len()];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;
        while let Some(vertex) = queue.pop_front() {
            for &(target, _) in &self.edges[vertex] {
                if target == to {
                    return true;
                }
                if !visited[target] {
                    visited[target] = true;
                    queue.push_back(target);
                }
            }
        }
        false
    }

    /// Rule 5: soft edges between plugins whose groups are ordered in the
    /// group DAG. A proposed edge that would close a cycle with the edges
    /// already present is silently dropped.
    pub(crate) fn add_group_edges(&mut self, groups: &[Group]) -> Result<()> {
        let declared: HashMap<&str, &Group> =
            groups.iter().map(|g| (g.name.as_str(), g)).collect();

        for group in groups {
            for after in &group.after {
                if !declared.contains_key(after.as_str()) {
                    return Err(Error::UndefinedGroup(after.clone()));
                }
            }
        }
        for entry in &self.entries {
            if let Some(name) = entry.group.as_deref() {
                if !declared.contains_key(name) {
                    return Err(Error::UndefinedGroup(name.to_string()));
                }
            }
        }

        let predecessors = transitive_predecessors(groups)?;

        let count = self.entries.len();
        for from in 0..count {
            let Some(from_group) = self.entries[from].group.clone() else {
                continue;
            };
            for to in 0..count {
                let Some(to_group) = self.entries[to].group.clone() else {
                    continue;
                };
                if from_group == to_group {
                    continue;
                }
                let ordered_before = predecessors
                    .get(to_group.as_str())
                    .map(|preds| preds.contains(from_group.as_str()))
                    .unwrap_or(false);
                if ordered_before && !self.path_exists(to, from) {
                    self.add_edge(from, to, EdgeType::Group);
                }
            }
        }
        Ok(())
    }

    /// Rule 6: order every remaining unordered pair. Candidate pairs are
    /// iterated in entry order and each insertion is guarded by a
    /// reachability check, so no cycle can form: the comparison is a total
    /// order on any antichain the earlier rules left behind.
    pub(crate) fn add_tie_break_edges(&mut self) {
        let count = self.entries.len();
        for first in 0..count {
            for second in (first + 1)..count {
                if self.path_exists(first, second) || self.path_exists(second, first) {
                    continue;
                }
                let (from, to) = if precedes(&self.entries[first], &self.entries[second]) {
                    (first, second)
                } else {
                    (second, first)
                };
                self.add_edge(from, to, EdgeType::TieBreak);
            }
        }
    }

    /// Reverse-postorder depth-first traversal. Roots are taken in reverse
    /// entry order so that, with the tie-break edges making reachability
    /// total, the emitted permutation is the unique topological order.
    pub(crate) fn topological_order(&self) -> Vec<String> {
        let mut visited = vec![false; self.entries.len()];
        let mut postorder = Vec::with_capacity(self.entries.len());

        for vertex in (0..self.entries.len()).rev() {
            if !visited[vertex] {
                self.postorder_visit(vertex, &mut visited, &mut postorder);
            }
        }

        postorder.reverse();
        postorder
            .into_iter()
            .map(|v| self.entries[v].name.clone())
            .collect()
    }

    fn postorder_visit(&self, vertex: usize, visited: &mut [bool], postorder: &mut Vec<usize>) {
        visited[vertex] = true;
        for &(target, _) in &self.edges[vertex] {
            if !visited[target] {
                self.postorder_visit(target, visited, postorder);
            }
        }
        postorder.push(vertex);
    }
}

/// For each group, every group name that transitively precedes it. A cycle
/// among the group declarations is reported as a cyclic interaction over
/// the group names.
fn transitive_predecessors(groups: &[Group]) -> Result<HashMap<&str, HashSet<&str>>> {
    let by_name: HashMap<&str, &Group> = groups.iter().map(|g| (g.name.as_str(), g)).collect();
    let mut result: HashMap<&str, HashSet<&str>> = HashMap::new();

    for group in groups {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        collect_predecessors(group.name.as_str(), &by_name, &mut seen, &mut stack)?;
        seen.remove(group.name.as_str());
        result.insert(group.name.as_str(), seen);
    }
    Ok(result)
}

fn collect_predecessors<'a>(
    name: &'a str,
    by_name: &HashMap<&'a str, &'a Group>,
    seen: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> Result<()> {
    if stack.contains(&name) {
        let start = stack.iter().position(|n| *n == name).unwrap_or(0);
        let cycle = stack[start..]
            .iter()
            .map(|n| CycleEdge {
                plugin: (*n).to_string(),
                edge_type: EdgeType::Group,
            })
            .collect();
        return Err(Error::CyclicInteraction(cycle));
    }
    if !seen.insert(name) {
        return Ok(());
    }
    stack.push(name);
    if let Some(group) = by_name.get(name) {
        for after in &group.after {
            collect_predecessors(after, by_name, seen, stack)?;
        }
    }
    stack.pop();
    Ok(())
}

/// The tie-break comparison: higher global priority first, then higher
/// priority, then current load order position, then name.
fn precedes(a: &SortEntry, b: &SortEntry) -> bool {
    b.global_priority
        .cmp(&a.global_priority)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.load_order_index.cmp(&b.load_order_index))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .is_le()
}
