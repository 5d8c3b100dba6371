use super::*;
use crate::error::DashboardError;
use crate::model::{LoadState, ServerDetails, ServerRecord, SystemInfo};
use async_trait::async_trait;
use std::collections::HashMap;

/// In-memory backend. Addresses missing from `details` answer with an error.
struct FakeClient {
    listing: Mutex<std::result::Result<Vec<ServerRecord>, String>>,
    details: HashMap<String, ServerDetails>,
}

impl FakeClient {
    fn with_listing(records: Vec<ServerRecord>) -> Self {
        Self {
            listing: Mutex::new(Ok(records)),
            details: HashMap::new(),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            listing: Mutex::new(Err(message.to_string())),
            details: HashMap::new(),
        }
    }

    fn set_listing(&self, listing: std::result::Result<Vec<ServerRecord>, String>) {
        *self.listing.lock().unwrap() = listing;
    }
}

#[async_trait]
impl ApiClient for FakeClient {
    async fn list_servers(&self) -> crate::Result<Vec<ServerRecord>> {
        self.listing
            .lock()
            .unwrap()
            .clone()
            .map_err(DashboardError::Http)
    }

    async fn server_details(&self, ip: &str) -> crate::Result<ServerDetails> {
        self.details.get(ip).cloned().ok_or(DashboardError::Status {
            url: format!("http://fake/servers/{ip}"),
            status: 500,
        })
    }
}

fn rec(ip: &str, dc: &str, cabinet: &str, position: &str) -> ServerRecord {
    ServerRecord {
        ip: ip.to_string(),
        hostname: Some(format!("host-{ip}")),
        data_center_id: Some(dc.to_string()),
        cabinet: Some(cabinet.to_string()),
        position: Some(position.to_string()),
    }
}

fn powered_on() -> ServerDetails {
    ServerDetails {
        system: SystemInfo {
            power_state: Some("On".to_string()),
            health: Some("OK".to_string()),
            ..SystemInfo::default()
        },
        ..ServerDetails::default()
    }
}

#[tokio::test]
async fn test_refresh_builds_tree_and_entries() {
    let mut client = FakeClient::with_listing(vec![
        rec("10.0.0.1", "DC1", "A", "1"),
        rec("10.0.0.2", "DC1", "A", "2"),
        rec("10.0.0.3", "DC2", "B", "1"),
    ]);
    client.details.insert("10.0.0.1".to_string(), powered_on());
    client.details.insert("10.0.0.3".to_string(), ServerDetails::default());

    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    refresh(&state, &client).await.unwrap();

    let s = lock_state(&state);
    assert_eq!(s.load, LoadState::Ready);
    assert!(!s.details_loading);
    assert_eq!(s.tree.datacenters().len(), 2);
    assert!(s.expand.is_expanded("DC1"));
    assert!(s.expand.is_expanded("DC2-B"));

    // Entries follow listing order
    let ips: Vec<&str> = s.entries.iter().map(|e| e.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    assert!(s.entries[1].is_unavailable());
    assert!(s.entries[1].error.as_deref().unwrap().contains("500"));

    let summary = s.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.up, 1);
    assert_eq!(summary.down, 2);
    assert_eq!(summary.unavailable, vec!["10.0.0.2".to_string()]);
}

#[tokio::test]
async fn test_refresh_record_without_address() {
    let mut client = FakeClient::with_listing(vec![
        rec("10.0.0.1", "DC1", "A", "1"),
        rec("", "DC1", "A", "2"),
    ]);
    client.details.insert("10.0.0.1".to_string(), powered_on());
    // Would answer if the empty address were ever requested
    client.details.insert(String::new(), powered_on());

    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    refresh(&state, &client).await.unwrap();

    let s = lock_state(&state);
    assert_eq!(s.tree.server_count(), 2);
    assert!(s.entries[1].is_unavailable());
    assert_eq!(
        s.entries[1].error.as_deref(),
        Some("No iDRAC address in inventory")
    );
    assert_eq!(s.summary().up, 1);
}

#[tokio::test]
async fn test_refresh_empty_listing() {
    let client = FakeClient::with_listing(vec![]);
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    refresh(&state, &client).await.unwrap();

    let s = lock_state(&state);
    assert_eq!(s.load, LoadState::Ready);
    assert!(s.tree.is_empty());
    assert!(s.expand.is_empty());
    assert!(s.entries.is_empty());
}

#[tokio::test]
async fn test_refresh_listing_failure_on_first_load() {
    let client = FakeClient::failing("connection refused");
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));

    let err = refresh(&state, &client).await.unwrap_err();
    assert!(matches!(err, DashboardError::Http(_)));

    let s = lock_state(&state);
    assert_eq!(
        s.load,
        LoadState::Failed("HTTP request failed: connection refused".to_string())
    );
    assert!(s.tree.is_empty());
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_tree_and_toggles() {
    let client = FakeClient::with_listing(vec![rec("10.0.0.1", "DC1", "A", "1")]);
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    refresh(&state, &client).await.unwrap();
    lock_state(&state).toggle_node("DC1-A-1");

    client.set_listing(Err("backend down".to_string()));
    assert!(refresh(&state, &client).await.is_err());

    let s = lock_state(&state);
    assert_eq!(s.load, LoadState::Ready);
    assert_eq!(s.tree.server_count(), 1);
    assert!(s.expand.is_expanded("DC1-A-1"));
    assert_eq!(
        s.last_error.as_deref(),
        Some("HTTP request failed: backend down")
    );
}

async fn wait_for(state: &SharedState, condition: impl Fn(&AppState) -> bool) {
    for _ in 0..200 {
        if condition(&lock_state(state)) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_poller_task_refreshes_on_wake() {
    let client = Arc::new(FakeClient::with_listing(vec![rec("10.0.0.1", "DC1", "A", "1")]));
    let state: SharedState = Arc::new(Mutex::new(AppState::default()));
    let wake = Arc::new(Notify::new());

    let task = tokio::spawn(poller_task(
        state.clone(),
        client.clone(),
        Duration::from_secs(3600),
        wake.clone(),
    ));

    // The first tick fires immediately
    wait_for(&state, |s| s.tree.server_count() == 1 && !s.details_loading).await;

    client.set_listing(Ok(vec![
        rec("10.0.0.1", "DC1", "A", "1"),
        rec("10.0.0.2", "DC9", "Z", "4"),
    ]));
    wake.notify_one();
    wait_for(&state, |s| s.tree.server_count() == 2).await;

    assert!(lock_state(&state).expand.is_expanded("DC9-Z"));
    task.abort();
}
