//! Adapter configuration
//!
//! Carried by the client handle and injected into every component, rather
//! than held in process-wide static state.

use serde::{Deserialize, Serialize};

/// Field stamped with the creation time when timestamps are enabled
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field stamped with the last update time when timestamps are enabled
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Field stamped instead of deleting when soft deletes are enabled
pub const DELETED_AT_FIELD: &str = "deletedAt";

/// Global adapter configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Inject `createdAt`/`updatedAt` server timestamps on writes
    pub timestamps: bool,
    /// `destroy` stamps `deletedAt` instead of deleting the document
    pub soft_deletes: bool,
}

impl Config {
    /// Configuration with both features off
    pub fn new() -> Self {
        Config::default()
    }

    /// Enable timestamp stamping
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    /// Enable soft deletes
    pub fn with_soft_deletes(mut self) -> Self {
        self.soft_deletes = true;
        self
    }
}
