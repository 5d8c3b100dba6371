//! Datacenter → cabinet → position grouping of the server listing, and the
//! expand/collapse flags of the sidebar tree built from it.
//!
//! Everything here is pure: [`build_tree`] derives a fresh [`GroupTree`] from a
//! listing, and every [`ExpandState`] transition returns a new value.

use super::server::ServerRecord;
use std::collections::HashMap;

pub const UNKNOWN_DC: &str = "Unknown DC";
pub const UNKNOWN_CABINET: &str = "Unknown Cabinet";
pub const UNKNOWN_POSITION: &str = "Unknown Position";

/// Joins the components of cabinet and position node ids.
pub const NODE_SEPARATOR: &str = "-";

pub fn cabinet_node_id(data_center: &str, cabinet: &str) -> String {
    format!("{data_center}{NODE_SEPARATOR}{cabinet}")
}

pub fn position_node_id(data_center: &str, cabinet: &str, position: &str) -> String {
    format!("{data_center}{NODE_SEPARATOR}{cabinet}{NODE_SEPARATOR}{position}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionGroup {
    pub id: String,
    pub servers: Vec<ServerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabinetGroup {
    pub id: String,
    pub positions: Vec<PositionGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCenterGroup {
    pub id: String,
    pub cabinets: Vec<CabinetGroup>,
}

impl DataCenterGroup {
    pub fn cabinet(&self, id: &str) -> Option<&CabinetGroup> {
        self.cabinets.iter().find(|c| c.id == id)
    }

    pub fn server_count(&self) -> usize {
        self.cabinets.iter().map(CabinetGroup::server_count).sum()
    }
}

impl CabinetGroup {
    pub fn position(&self, id: &str) -> Option<&PositionGroup> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn server_count(&self) -> usize {
        self.positions.iter().map(|p| p.servers.len()).sum()
    }
}

/// A level of the tree whose children are looked up by id.
trait Group {
    fn new(id: &str) -> Self;
    fn id(&self) -> &str;
}

impl Group for DataCenterGroup {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            cabinets: Vec::new(),
        }
    }
    fn id(&self) -> &str {
        &self.id
    }
}

impl Group for CabinetGroup {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            positions: Vec::new(),
        }
    }
    fn id(&self) -> &str {
        &self.id
    }
}

impl Group for PositionGroup {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            servers: Vec::new(),
        }
    }
    fn id(&self) -> &str {
        &self.id
    }
}

/// Finds the group with `id`, appending a new one at the end if it is not
/// there yet so that first-seen order is kept.
fn group_entry<'a, G: Group>(groups: &'a mut Vec<G>, id: &str) -> &'a mut G {
    let idx = match groups.iter().position(|g| g.id() == id) {
        Some(idx) => idx,
        None => {
            groups.push(G::new(id));
            groups.len() - 1
        }
    };
    &mut groups[idx]
}

/// Servers grouped by datacenter, cabinet and position, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTree {
    datacenters: Vec<DataCenterGroup>,
}

impl GroupTree {
    pub fn datacenters(&self) -> &[DataCenterGroup] {
        &self.datacenters
    }

    pub fn datacenter(&self, id: &str) -> Option<&DataCenterGroup> {
        self.datacenters.iter().find(|d| d.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.datacenters.is_empty()
    }

    pub fn server_count(&self) -> usize {
        self.datacenters.iter().map(DataCenterGroup::server_count).sum()
    }

    /// All leaf servers in display order.
    pub fn servers(&self) -> impl Iterator<Item = &ServerRecord> {
        self.datacenters
            .iter()
            .flat_map(|d| &d.cabinets)
            .flat_map(|c| &c.positions)
            .flat_map(|p| &p.servers)
    }

    fn insert(&mut self, record: &ServerRecord) {
        let dc = group_entry(&mut self.datacenters, record.data_center());
        let cabinet = group_entry(&mut dc.cabinets, record.cabinet());
        let position = group_entry(&mut cabinet.positions, record.position());
        position.servers.push(record.clone());
    }
}

/// Groups `records` in input order. Missing grouping fields fall back to the
/// `UNKNOWN_*` sentinels, so every record ends up in exactly one leaf.
pub fn build_tree(records: &[ServerRecord]) -> GroupTree {
    let mut tree = GroupTree::default();
    for record in records {
        tree.insert(record);
    }
    tree
}

/// Default view: every datacenter and cabinet open, positions closed.
pub fn initial_expand_state(tree: &GroupTree) -> ExpandState {
    let mut flags = HashMap::new();
    for dc in tree.datacenters() {
        flags.insert(dc.id.clone(), true);
        for cabinet in &dc.cabinets {
            flags.insert(cabinet_node_id(&dc.id, &cabinet.id), true);
        }
    }
    ExpandState { flags }
}

/// Which sidebar nodes are open. A missing id is collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    flags: HashMap<String, bool>,
}

impl ExpandState {
    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.flags.get(node_id).copied().unwrap_or(false)
    }

    pub fn get(&self, node_id: &str) -> Option<bool> {
        self.flags.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    /// Copy with the flag at `node_id` inverted. The id is not checked
    /// against any tree.
    pub fn toggled(&self, node_id: &str) -> Self {
        let mut flags = self.flags.clone();
        let flag = flags.entry(node_id.to_string()).or_insert(false);
        *flag = !*flag;
        Self { flags }
    }

    /// Copy that keeps every existing flag and adds the initial-view default
    /// for datacenter and cabinet nodes of `tree` that have no flag yet.
    pub fn with_defaults_for(&self, tree: &GroupTree) -> Self {
        let mut flags = self.flags.clone();
        for (id, expanded) in initial_expand_state(tree).flags {
            flags.entry(id).or_insert(expanded);
        }
        Self { flags }
    }
}

impl FromIterator<(String, bool)> for ExpandState {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "grouping_tests.rs"]
mod tests;
