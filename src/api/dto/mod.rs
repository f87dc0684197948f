//! Data Transfer Objects for REST request/response serialization.
//!
//! LSNs cross the wire as `HEX/HEX` text and restore states as their
//! snake_case names.

pub mod backup_dto;
pub mod restore_dto;
pub mod wal_dto;

pub use backup_dto::*;
pub use restore_dto::*;
pub use wal_dto::*;
