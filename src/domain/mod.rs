//! Domain layer: WAL naming, log positions, catalog rows, restore states
//! and the event system.
//!
//! Nothing in this module touches the filesystem, the database or an
//! external process.

pub mod event_bus;
pub mod lsn;
pub mod pitr_event;
pub mod restore_id;
pub mod restore_state;
pub mod segment;
pub mod wal_name;

pub use event_bus::EventBus;
pub use lsn::Lsn;
pub use pitr_event::PitrEvent;
pub use restore_id::RestoreId;
pub use restore_state::{RestoreState, RestoreStep};
pub use segment::WalSegmentRecord;
pub use wal_name::{WalFileName, compute_start_lsn, parse_wal_filename};
