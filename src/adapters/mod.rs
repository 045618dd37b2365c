//! Adapters layer: Concrete implementations of ports.
//!
//! - `forest`: monotone random forest implementing `StressModel`
//! - `sanitize`: health-data filtering for logs

pub mod forest;
pub mod sanitize;
