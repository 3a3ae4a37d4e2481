//! Domain services

pub mod aggregator;
pub mod calculator;
pub mod classifier;
pub mod cleaner;
pub mod logistics_audit;
pub mod merger;
pub mod normalizer;
pub mod pipeline;

pub use calculator::{compute_metrics, DEFAULT_TOLERANCE};
pub use classifier::classify;
pub use logistics_audit::{prepare_trips, run_audit, TripFilter};
pub use pipeline::{run_consumption_pipeline, ConsumptionInputs};
