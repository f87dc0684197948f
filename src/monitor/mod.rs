//! Periodic archive monitoring.
//!
//! [`scheduler`] owns the timer loop and its stop signal; [`wal_monitor`]
//! owns what one tick does.

pub mod scheduler;
pub mod wal_monitor;

pub use scheduler::{PeriodicTask, spawn_periodic};
pub use wal_monitor::{TickReport, WalMonitor};
