//! Maintenance task implementations.

pub mod maintenance;

pub use maintenance::MaintenanceTasks;
