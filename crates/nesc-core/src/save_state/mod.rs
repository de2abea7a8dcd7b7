//! Save state schema for the NES core.
//!
//! A [`SaveState`] is a plain, `serde`-derived value composing every
//! component's own state: the CPU, PPU, and APU structs already derive
//! `Serialize`/`Deserialize` (see each crate's top-level state struct), and
//! the mapper contributes an opaque, mapper-tagged [`MapperSnapshot`]. The
//! core never picks a wire format — `bincode`, `serde_json`, whatever the
//! host prefers all round-trip through this struct identically; only the
//! Rust value is guaranteed.
//!
//! Battery-backed PRG-RAM is available standalone via
//! [`Mapper::battery_ram`]/[`Mapper::set_battery_ram`] for hosts that persist
//! it independently of full snapshots (e.g. on cartridge "eject").

pub mod error;

pub use error::SaveStateError;

use nesc_apu::Apu;
use nesc_cpu::Cpu;
use nesc_mappers::MapperSnapshot;
use nesc_ppu::Ppu;
use serde::{Deserialize, Serialize};

use crate::bus::ControllerState;
use crate::input::Zapper;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Current save-state schema version. Bumped whenever a component's state
/// struct changes shape in a way that breaks old snapshots.
pub const SAVE_STATE_VERSION: u32 = 1;

/// A complete, versioned snapshot of console state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// Schema version this snapshot was produced under.
    pub version: u32,
    /// CRC32 of the ROM (PRG+CHR) this snapshot was captured against.
    pub rom_crc32: u32,
    /// CPU registers, flags, and open-bus latch.
    pub cpu: Cpu,
    /// PPU registers, scroll state, nametable/palette RAM, and timing.
    pub ppu: Ppu,
    /// APU channel and frame-counter state.
    pub apu: Apu,
    /// Mapper-specific bank registers, IRQ counters, and ExRAM/PRG-RAM.
    pub mapper: MapperSnapshot,
    /// 2 KiB internal system RAM.
    pub ram: Vec<u8>,
    /// Controller 1 button state.
    pub controller1: ControllerState,
    /// Controller 2 button state.
    pub controller2: ControllerState,
    /// Zapper state, if one was connected when the snapshot was taken.
    pub zapper: Option<Zapper>,
}

impl SaveState {
    /// Validate this snapshot against the running console before it is
    /// applied: wrong schema version or wrong cartridge are both refused
    /// rather than silently producing garbage state.
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::VersionMismatch`] or
    /// [`SaveStateError::RomMismatch`] if the snapshot does not apply to
    /// the currently loaded ROM.
    pub fn validate(&self, rom_crc32: u32) -> Result<(), SaveStateError> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                found: self.version,
            });
        }
        if self.rom_crc32 != rom_crc32 {
            return Err(SaveStateError::RomMismatch {
                expected_crc32: self.rom_crc32,
                found_crc32: rom_crc32,
            });
        }
        Ok(())
    }
}
