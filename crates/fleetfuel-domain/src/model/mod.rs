//! Domain models

pub mod logistics;
pub mod table;
pub mod vehicle;

pub use logistics::*;
pub use table::*;
pub use vehicle::*;
