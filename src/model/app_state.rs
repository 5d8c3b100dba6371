use super::grouping::{ExpandState, GroupTree, build_tree, initial_expand_state};
use super::server::{ServerEntry, ServerRecord};
use super::summary::FleetSummary;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    /// No listing has arrived yet
    #[default]
    Loading,
    Ready,
    /// The very first listing request failed
    Failed(String),
}

/// Session state shared between the poller and the UI.
#[derive(Debug, Default)]
pub struct AppState {
    pub servers: Vec<ServerRecord>,
    pub tree: GroupTree,
    pub expand: ExpandState,
    pub entries: Vec<ServerEntry>,
    pub load: LoadState,
    pub details_loading: bool,
    pub last_error: Option<String>,
    pub last_refresh: Option<DateTime<Local>>,
}

impl AppState {
    /// Replaces the listing and regroups it. The first listing opens every
    /// datacenter and cabinet; later ones keep the user's flags.
    pub fn apply_listing(&mut self, records: Vec<ServerRecord>) {
        let tree = build_tree(&records);
        self.expand = match self.load {
            LoadState::Ready => self.expand.with_defaults_for(&tree),
            _ => initial_expand_state(&tree),
        };
        self.tree = tree;
        // Entries of servers that left the inventory would skew the summary
        // until the new details arrive
        self.entries.retain(|entry| records.iter().any(|record| record.ip == entry.ip));
        self.servers = records;
        self.load = LoadState::Ready;
        self.last_error = None;
        self.details_loading = true;
    }

    /// The tree keeps whatever it showed before the failed request.
    pub fn apply_listing_error(&mut self, error: String) {
        if self.load != LoadState::Ready {
            self.load = LoadState::Failed(error.clone());
        }
        self.last_error = Some(error);
        self.details_loading = false;
    }

    pub fn apply_details(&mut self, entries: Vec<ServerEntry>) {
        self.entries = entries;
        self.details_loading = false;
        self.last_refresh = Some(Local::now());
    }

    pub fn toggle_node(&mut self, node_id: &str) {
        self.expand = self.expand.toggled(node_id);
    }

    pub fn entry(&self, ip: &str) -> Option<&ServerEntry> {
        self.entries.iter().find(|e| e.ip == ip)
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary::new(self.servers.len(), &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ip: &str, dc: &str, cabinet: &str) -> ServerRecord {
        ServerRecord {
            ip: ip.to_string(),
            hostname: None,
            data_center_id: Some(dc.to_string()),
            cabinet: Some(cabinet.to_string()),
            position: Some("1".to_string()),
        }
    }

    #[test]
    fn test_first_listing_sets_initial_expansion() {
        let mut state = AppState::default();
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A")]);

        assert_eq!(state.load, LoadState::Ready);
        assert!(state.details_loading);
        assert!(state.expand.is_expanded("DC1"));
        assert!(state.expand.is_expanded("DC1-A"));
        assert!(!state.expand.is_expanded("DC1-A-1"));
    }

    #[test]
    fn test_later_listing_keeps_toggles() {
        let mut state = AppState::default();
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A")]);
        state.toggle_node("DC1");
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A"), rec("10.0.0.2", "DC2", "B")]);

        assert!(!state.expand.is_expanded("DC1"));
        assert!(state.expand.is_expanded("DC2"));
        assert_eq!(state.tree.server_count(), 2);
    }

    #[test]
    fn test_later_listing_drops_entries_of_removed_servers() {
        let mut state = AppState::default();
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A"), rec("10.0.0.2", "DC1", "A")]);
        state.apply_details(vec![
            ServerEntry::failed("10.0.0.1", "timeout"),
            ServerEntry::failed("10.0.0.2", "timeout"),
        ]);

        state.apply_listing(vec![rec("10.0.0.2", "DC1", "A"), rec("10.0.0.3", "DC2", "B")]);

        assert!(state.details_loading);
        assert!(state.entry("10.0.0.1").is_none());
        assert!(state.entry("10.0.0.2").is_some());
        let summary = state.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.unavailable, vec!["10.0.0.2".to_string()]);
    }

    #[test]
    fn test_first_failure_is_fatal_for_the_page() {
        let mut state = AppState::default();
        state.apply_listing_error("HTTP error! status: 500".to_string());
        assert_eq!(
            state.load,
            LoadState::Failed("HTTP error! status: 500".to_string())
        );
        assert!(state.tree.is_empty());
    }

    #[test]
    fn test_later_failure_keeps_tree() {
        let mut state = AppState::default();
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A")]);
        let before = state.tree.clone();

        state.apply_listing_error("connection refused".to_string());

        assert_eq!(state.load, LoadState::Ready);
        assert_eq!(state.tree, before);
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
        assert!(!state.details_loading);
    }

    #[test]
    fn test_apply_details() {
        let mut state = AppState::default();
        state.apply_listing(vec![rec("10.0.0.1", "DC1", "A")]);
        state.apply_details(vec![ServerEntry::failed("10.0.0.1", "timeout")]);

        assert!(!state.details_loading);
        assert!(state.last_refresh.is_some());
        assert!(state.entry("10.0.0.1").unwrap().is_unavailable());
        assert!(state.entry("10.0.0.2").is_none());

        let summary = state.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.down, 1);
    }
}
