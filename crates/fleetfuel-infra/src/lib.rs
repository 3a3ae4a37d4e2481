//! Infrastructure layer for fleetfuel-checker

pub mod access_list;
pub mod run_cache;
pub mod spreadsheet_loader;

pub use access_list::{AccessEntry, AccessList};
pub use run_cache::{CacheStats, RunCache};
pub use spreadsheet_loader::load_table;
