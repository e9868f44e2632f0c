//! Pulseboard Runner: refresh orchestration on top of `pulseboard-core`.
//!
//! This crate provides:
//! - TOML configuration with source profiles and policy selection
//! - The aggregator that turns four concurrent fetches into one snapshot
//! - The refresh scheduler and the view-state holder it writes to
//! - The campaign table query pipeline (search, filter, sort, paginate)
//! - CSV and JSON export

pub mod aggregator;
pub mod config;
pub mod export;
pub mod scheduler;
pub mod sources;
pub mod table;
pub mod view_state;

pub use aggregator::{
    Aggregator, AssemblyPolicy, RefreshError, SlotFailure, SnapshotSource, SourceSet,
};
pub use config::{ConfigError, DashboardConfig, Profile};
pub use export::{
    export_campaigns_csv, export_snapshot_json, save_campaigns_csv, save_snapshot_json,
    EXPORT_FILE_NAME,
};
pub use scheduler::{RefreshScheduler, SchedulerPhase, MIN_INTERVAL};
pub use sources::{build_aggregator, build_sources, geographic_source, http_transport};
pub use table::{SortDirection, SortField, StatusFilter, TablePage, TableQuery};
pub use view_state::{DashboardState, LoadStatus, SessionToken, ViewState};
