//! Application service layer - use cases, config, session, reporting, export

pub mod app;
pub mod config;
pub mod export;
pub mod report;
pub mod session;

pub use config::Config;
pub use session::Session;
