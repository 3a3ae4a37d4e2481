//! Use cases driven by the CLI

pub mod consumption_service;
pub mod logistics_service;

pub use consumption_service::{
    report_view, run_consumption, ConsumptionOptions, ConsumptionResult, ProgressCallback,
};
pub use logistics_service::{build_dashboard, load_trips, run_logistics, LogisticsDashboard};
