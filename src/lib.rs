//! # pitr-gateway
//!
//! WAL cataloging and point-in-time restore orchestration for a PostgreSQL
//! primary/standby pair.
//!
//! A periodic monitor keeps a catalog of archived WAL segments in step with
//! the archive directory. Operators trigger base backups of the primary and
//! restores of a separate target through a REST API. A restore rebuilds the
//! target from the latest backup and replays archived WAL, optionally up to
//! a chosen LSN. Progress is streamed over a WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PitrService (service/)
//!     │     ├── BackupController ──┐
//!     │     └── RestoreOrchestrator ┴── CommandExecutor (exec/) ── docker exec
//!     ├── EventBus (domain/)
//!     │
//!     ├── WalMonitor (monitor/) ── ArchiveDir (archive/)
//!     │
//!     └── WalCatalog (persistence/) ── PostgreSQL | in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod exec;
pub mod monitor;
pub mod persistence;
pub mod service;
pub mod ws;
