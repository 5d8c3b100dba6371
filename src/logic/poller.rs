use crate::error::Result;
use crate::logic::ApiClient;
use crate::model::{AppState, ServerEntry};
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

pub type SharedState = Arc<Mutex<AppState>>;

/// Locks the shared state. A panic on the other side of the lock does not
/// invalidate the data, so a poisoned lock is recovered.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One refresh cycle: fetch the listing, regroup it, then fetch every
/// server's details in parallel.
///
/// A failed listing leaves the tree as it was and is returned to the caller.
/// Failed detail requests become unavailable entries.
pub async fn refresh(state: &SharedState, client: &dyn ApiClient) -> Result<()> {
    let records = match client.list_servers().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Failed to fetch server list: {}", e);
            lock_state(state).apply_listing_error(e.to_string());
            return Err(e);
        }
    };

    let ips: Vec<String> = records.iter().map(|r| r.ip.clone()).collect();
    tracing::debug!("Server list has {} entries", ips.len());
    lock_state(state).apply_listing(records);

    let detail_requests = ips.iter().map(|ip| async move {
        if ip.is_empty() {
            return ServerEntry::failed("", "No iDRAC address in inventory");
        }
        match client.server_details(ip).await {
            Ok(details) => ServerEntry::loaded(ip.as_str(), details),
            Err(e) => {
                tracing::warn!("Failed to fetch details for {}: {}", ip, e);
                ServerEntry::failed(ip.as_str(), e.to_string())
            }
        }
    });
    let entries = join_all(detail_requests).await;

    let unavailable = entries.iter().filter(|e| e.is_unavailable()).count();
    tracing::info!(
        "Refreshed {} servers ({} unavailable)",
        entries.len(),
        unavailable
    );
    lock_state(state).apply_details(entries);
    Ok(())
}

/// Background task that refreshes the state every `interval`, or earlier
/// when `wake` is notified.
pub async fn poller_task(
    state: SharedState,
    client: Arc<dyn ApiClient>,
    interval: Duration,
    wake: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {
                tracing::debug!("Manual refresh requested");
                ticker.reset();
            }
        }

        // Errors are already recorded in the state
        let _ = refresh(&state, client.as_ref()).await;
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
