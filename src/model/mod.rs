pub mod app_state;
pub mod grouping;
pub mod server;
pub mod summary;

pub use app_state::{AppState, LoadState};
pub use grouping::{
    CabinetGroup, DataCenterGroup, ExpandState, GroupTree, PositionGroup, build_tree,
    cabinet_node_id, initial_expand_state, position_node_id,
};
pub use server::{
    HealthStatus, PowerState, ServerDetails, ServerEntry, ServerRecord, SystemInfo, WarrantyInfo,
};
pub use summary::FleetSummary;
