//! Background maintenance for ParkHub.
//!
//! - A cron scheduler that triggers the periodic tasks
//! - The tasks themselves: revocation-blacklist pruning and expired
//!   session, refresh-record and reset-token cleanup

pub mod jobs;
pub mod scheduler;

pub use jobs::MaintenanceTasks;
pub use scheduler::MaintenanceScheduler;
