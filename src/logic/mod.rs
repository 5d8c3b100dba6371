pub mod client;
pub mod poller;

pub use client::{ApiClient, ReqwestApiClient, parse_details, parse_listing};
pub use poller::{SharedState, lock_state, poller_task, refresh};
