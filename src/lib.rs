//! Desktop dashboard for Dell iDRAC-managed servers.
//!
//! The backend inventory is polled in the background, grouped into a
//! datacenter → cabinet → position tree for the sidebar, and rendered with
//! egui.

pub mod app;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;

pub use config::{Config, load_config};
pub use error::{DashboardError, Result};
