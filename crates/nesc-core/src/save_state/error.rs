//! Save state error types.

use thiserror::Error;

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// Save state operation error.
#[derive(Debug, Clone, Error)]
pub enum SaveStateError {
    /// The snapshot was produced by a different save-state schema version
    /// than this build understands.
    #[error("save state version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build produces and restores.
        expected: u32,
        /// Version recorded in the snapshot being restored.
        found: u32,
    },

    /// The snapshot's ROM CRC32 does not match the cartridge currently
    /// loaded into the console.
    #[error("save state ROM mismatch: expected CRC32 {expected_crc32:08x}, loaded ROM is {found_crc32:08x}")]
    RomMismatch {
        /// CRC32 recorded in the snapshot.
        expected_crc32: u32,
        /// CRC32 of the ROM currently loaded.
        found_crc32: u32,
    },

    /// The snapshot's mapper-specific payload could not be applied (wrong
    /// mapper number, or the mapper rejected its own serialized bytes).
    #[error("save state corrupt: {0}")]
    Corrupt(String),
}
