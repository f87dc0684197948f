//! Read models derived from the catalog.

use serde::Serialize;

use crate::domain::Lsn;

/// A cataloged segment together with the LSN at which it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalLsnInfo {
    /// Canonical segment name.
    pub file_name: String,
    /// First position covered by the segment.
    pub start_lsn: Lsn,
}
