//! Mapper Trait Definition.
//!
//! This module defines the core `Mapper` trait that all NES cartridge mappers
//! must implement. Mappers handle memory banking for PRG-ROM, CHR-ROM/RAM,
//! and provide mirroring control.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement).
    #[default]
    Horizontal,
    /// Vertical mirroring (horizontal arrangement).
    Vertical,
    /// Single-screen, lower bank.
    SingleScreenLower,
    /// Single-screen, upper bank.
    SingleScreenUpper,
    /// Four-screen (uses extra VRAM).
    FourScreen,
}

/// Mapper trait.
///
/// All NES cartridge mappers must implement this trait. The mapper handles:
/// - PRG-ROM/RAM memory access (CPU $8000-$FFFF, optionally $6000-$7FFF)
/// - CHR-ROM/RAM memory access (PPU $0000-$1FFF)
/// - Nametable mirroring control
/// - Optional IRQ generation
/// - Optional scanline counting
pub trait Mapper: Send + Sync {
    /// Read a byte from PRG memory (CPU address space).
    ///
    /// Address range: $6000-$FFFF
    /// - $6000-$7FFF: PRG-RAM (battery-backed or work RAM)
    /// - $8000-$FFFF: PRG-ROM (banked)
    fn read_prg(&self, addr: u16) -> u8;

    /// Write a byte to PRG memory (CPU address space).
    ///
    /// Address range: $6000-$FFFF
    /// - $6000-$7FFF: PRG-RAM writes (if present)
    /// - $8000-$FFFF: Mapper register writes
    fn write_prg(&mut self, addr: u16, val: u8);

    /// Read a byte from CHR memory (PPU address space).
    ///
    /// Address range: $0000-$1FFF
    fn read_chr(&self, addr: u16) -> u8;

    /// Write a byte to CHR memory (PPU address space).
    ///
    /// Only works if the cartridge has CHR-RAM instead of CHR-ROM.
    fn write_chr(&mut self, addr: u16, val: u8);

    /// Get the current nametable mirroring mode.
    fn mirroring(&self) -> Mirroring;

    /// Check if the mapper has a pending IRQ.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Acknowledge/clear the IRQ.
    fn irq_acknowledge(&mut self) {}

    /// Clock the mapper (called every CPU cycle).
    ///
    /// Some mappers (like MMC3) count CPU cycles for IRQ timing.
    fn clock(&mut self, _cycles: u8) {}

    /// Notify the mapper of a scanline (called every PPU scanline).
    ///
    /// Some mappers (like MMC3) count scanlines for IRQ timing.
    fn scanline(&mut self) {}

    /// Notify the mapper of PPU A12 rising edge.
    ///
    /// MMC3 uses A12 for IRQ timing.
    fn ppu_a12_rising(&mut self) {}

    /// Get the mapper number (iNES mapper ID).
    fn mapper_number(&self) -> u16;

    /// Get the mapper name.
    fn mapper_name(&self) -> &'static str;

    /// Check if the mapper has battery-backed RAM.
    fn has_battery(&self) -> bool {
        false
    }

    /// Get a reference to the battery-backed RAM for saving.
    fn battery_ram(&self) -> Option<&[u8]> {
        None
    }

    /// Set the battery-backed RAM content (for loading saves).
    fn set_battery_ram(&mut self, _data: &[u8]) {}

    /// Reset the mapper to its initial state.
    fn reset(&mut self) {}

    /// Capture mapper-specific register/bank state for a save state.
    ///
    /// PRG/CHR ROM contents are never included (the host already has the
    /// cartridge image); this is just bank registers, IRQ counters, and
    /// similar small state. The default returns an empty blob tagged with
    /// this mapper's number, which is correct for mappers with no
    /// switchable state (`NROM`) but means restoring a snapshot for a
    /// stateful mapper that hasn't overridden this reinitializes it to
    /// power-on configuration rather than the banking in effect at
    /// snapshot time.
    fn snapshot(&self) -> MapperSnapshot {
        MapperSnapshot {
            mapper_number: self.mapper_number(),
            data: alloc::vec::Vec::new(),
        }
    }

    /// Restore mapper-specific state previously produced by `snapshot`.
    fn restore(&mut self, _snapshot: &MapperSnapshot) {}

    /// Intercept a nametable fetch before the PPU's default mirroring applies.
    ///
    /// Mappers that supply their own nametable source (MMC5's ExRAM modes,
    /// VRC-style fill modes) return `Some(byte)`; everyone else returns
    /// `None` and the PPU falls back to its own VRAM with `mirroring()`.
    fn nametable_override(&self, _addr: u16) -> Option<u8> {
        None
    }

    /// Sample the mapper's own expansion audio (MMC5's extra pulses and PCM
    /// channel, VRC6/N163-style chips on other boards). Mixed additively by
    /// the bus alongside the APU's five channels; mappers with no audio
    /// hardware return silence.
    fn expansion_audio(&self) -> f32 {
        0.0
    }

    /// Intercept a nametable write before the PPU's default mirroring applies.
    ///
    /// Returns `true` if the mapper consumed the write (e.g. MMC5 ExRAM),
    /// meaning the PPU should not also store it in its own VRAM.
    fn nametable_write_override(&mut self, _addr: u16, _val: u8) -> bool {
        false
    }
}

/// Versioned, mapper-specific snapshot of bank/register state for save states.
///
/// `data` is an opaque blob produced by the originating mapper's own
/// `bincode` serialization of its registers, IRQ counters, and similar
/// state; `mapper_number` lets `restore` refuse a snapshot captured from a
/// different mapper before touching any state rather than silently
/// deserializing garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapperSnapshot {
    /// iNES mapper number of the mapper that produced this snapshot.
    pub mapper_number: u16,
    /// Mapper-defined, opaque serialized state.
    pub data: alloc::vec::Vec<u8>,
}
