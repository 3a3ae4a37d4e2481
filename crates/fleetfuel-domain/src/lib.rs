//! Domain layer: tabular model, reconciliation pipeline and audit rules

pub mod model;
pub mod service;

pub use model::*;
