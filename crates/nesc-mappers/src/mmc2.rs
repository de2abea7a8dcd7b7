//! Mapper 9: MMC2 (Punch-Out!!).
//!
//! MMC2's defining trick is latch-driven CHR banking: the PPU's own pattern
//! fetches flip a pair of internal latches as a side effect of *reading*
//! specific tile indices ($FD/$FE) near the end of each 4KB half of the
//! pattern table. Punch-Out!! uses this to swap in an alternate half of the
//! CHR table mid-frame without any CPU-side bank register write.
//!
//! Because the latch flip happens on an ordinary PPU CHR read (an `&self`
//! method on the `Mapper` trait), the latches live behind interior mutability
//! rather than plain fields -- a read that must still look pure from the
//! bus's point of view.
//!
//! # Bank Configuration
//!
//! - PRG-ROM: one switchable 8KB bank at $8000-$9FFF, three fixed 8KB banks
//!   (the last three in the ROM) at $A000-$FFFF.
//! - CHR-ROM: two independently latched 4KB halves.
//!
//! # Games
//!
//! - Punch-Out!! / Mike Tyson's Punch-Out!!

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// MMC2 mapper implementation (Mapper 9).
///
/// The latches are `AtomicBool` rather than `Cell<LatchState>`: `Mapper`
/// requires `Send + Sync`, and `Cell` is never `Sync`. The core is
/// single-threaded, so `Ordering::Relaxed` is sufficient.
#[derive(Debug)]
pub struct Mmc2 {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    prg_banks: usize,
    chr_banks_4k: usize,

    prg_bank: u8,
    /// CHR bank selected for pattern-table half 0 when its latch reads $FD.
    chr_0_fd: u8,
    /// CHR bank selected for pattern-table half 0 when its latch reads $FE.
    chr_0_fe: u8,
    /// CHR bank selected for pattern-table half 1 when its latch reads $FD.
    chr_1_fd: u8,
    /// CHR bank selected for pattern-table half 1 when its latch reads $FE.
    chr_1_fe: u8,

    /// `true` when the latch currently reads $FD, `false` for $FE.
    latch_0: AtomicBool,
    latch_1: AtomicBool,

    mirroring: Mirroring,
}

impl Clone for Mmc2 {
    fn clone(&self) -> Self {
        Self {
            prg_rom: self.prg_rom.clone(),
            chr_rom: self.chr_rom.clone(),
            prg_banks: self.prg_banks,
            chr_banks_4k: self.chr_banks_4k,
            prg_bank: self.prg_bank,
            chr_0_fd: self.chr_0_fd,
            chr_0_fe: self.chr_0_fe,
            chr_1_fd: self.chr_1_fd,
            chr_1_fe: self.chr_1_fe,
            latch_0: AtomicBool::new(self.latch_0.load(Ordering::Relaxed)),
            latch_1: AtomicBool::new(self.latch_1.load(Ordering::Relaxed)),
            mirroring: self.mirroring,
        }
    }
}

impl Mmc2 {
    /// Create a new MMC2 mapper from ROM data.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let prg_banks = (rom.prg_rom.len() / 8192).max(1);
        let chr_banks_4k = (rom.chr_rom.len() / 4096).max(1);

        Self {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            prg_banks,
            chr_banks_4k,
            prg_bank: 0,
            chr_0_fd: 0,
            chr_0_fe: 0,
            chr_1_fd: 0,
            chr_1_fe: 0,
            latch_0: AtomicBool::new(false),
            latch_1: AtomicBool::new(false),
            mirroring: rom.header.mirroring,
        }
    }

    fn prg_addr(&self, addr: u16) -> usize {
        let bank = match addr {
            0x8000..=0x9FFF => self.prg_bank as usize % self.prg_banks,
            0xA000..=0xBFFF => self.prg_banks.saturating_sub(3),
            0xC000..=0xDFFF => self.prg_banks.saturating_sub(2),
            0xE000..=0xFFFF => self.prg_banks.saturating_sub(1),
            _ => 0,
        };
        bank * 8192 + (addr & 0x1FFF) as usize
    }

    /// Update the latch for a pattern-table half after observing a tile fetch.
    ///
    /// Real hardware flips the latch when the PPU reads byte 0 of the tile
    /// at index $FD or $FE within the last 16 bytes of each half (i.e. the
    /// fetch addresses $0FD8-$0FDF / $0FE8-$0FEF and their $1xxx mirrors).
    fn update_latch(&self, addr: u16) {
        let offset = addr & 0x0FFF;
        let half = if addr & 0x1000 == 0 {
            &self.latch_0
        } else {
            &self.latch_1
        };
        if (0x0FD8..=0x0FDF).contains(&offset) {
            half.store(true, Ordering::Relaxed);
        } else if (0x0FE8..=0x0FEF).contains(&offset) {
            half.store(false, Ordering::Relaxed);
        }
    }

    fn chr_addr(&self, addr: u16) -> usize {
        self.update_latch(addr);

        let (bank_fd, bank_fe, latch_is_fd) = if addr & 0x1000 == 0 {
            (self.chr_0_fd, self.chr_0_fe, self.latch_0.load(Ordering::Relaxed))
        } else {
            (self.chr_1_fd, self.chr_1_fe, self.latch_1.load(Ordering::Relaxed))
        };

        let bank = if latch_is_fd { bank_fd } else { bank_fe };
        let bank = bank as usize % self.chr_banks_4k;
        bank * 4096 + (addr & 0x0FFF) as usize
    }
}

impl Mapper for Mmc2 {
    fn read_prg(&self, addr: u16) -> u8 {
        if addr < 0x8000 {
            return 0;
        }
        self.prg_rom.get(self.prg_addr(addr)).copied().unwrap_or(0)
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        match addr {
            0xA000..=0xAFFF => self.prg_bank = val & 0x0F,
            0xB000..=0xBFFF => self.chr_0_fd = val & 0x1F,
            0xC000..=0xCFFF => self.chr_0_fe = val & 0x1F,
            0xD000..=0xDFFF => self.chr_1_fd = val & 0x1F,
            0xE000..=0xEFFF => self.chr_1_fe = val & 0x1F,
            0xF000..=0xFFFF => {
                self.mirroring = if val & 1 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
            }
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr_rom.get(self.chr_addr(addr)).copied().unwrap_or(0)
    }

    fn write_chr(&mut self, _addr: u16, _val: u8) {
        // CHR-ROM only; MMC2 boards never shipped with CHR-RAM.
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u16 {
        9
    }

    fn mapper_name(&self) -> &'static str {
        "MMC2"
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
        self.latch_0.store(false, Ordering::Relaxed);
        self.latch_1.store(false, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MapperSnapshot {
        let data = {
            #[cfg(feature = "serde")]
            {
                let state = Mmc2State {
                    prg_bank: self.prg_bank,
                    chr_0_fd: self.chr_0_fd,
                    chr_0_fe: self.chr_0_fe,
                    chr_1_fd: self.chr_1_fd,
                    chr_1_fe: self.chr_1_fe,
                    latch_0_fd: self.latch_0.load(Ordering::Relaxed),
                    latch_1_fd: self.latch_1.load(Ordering::Relaxed),
                    mirroring: self.mirroring,
                };
                bincode::serialize(&state).unwrap_or_default()
            }
            #[cfg(not(feature = "serde"))]
            {
                alloc::vec::Vec::new()
            }
        };
        MapperSnapshot {
            mapper_number: self.mapper_number(),
            data,
        }
    }

    fn restore(&mut self, _snapshot: &MapperSnapshot) {
        #[cfg(feature = "serde")]
        if _snapshot.mapper_number == self.mapper_number() {
            if let Ok(state) = bincode::deserialize::<Mmc2State>(&_snapshot.data) {
                self.prg_bank = state.prg_bank;
                self.chr_0_fd = state.chr_0_fd;
                self.chr_0_fe = state.chr_0_fe;
                self.chr_1_fd = state.chr_1_fd;
                self.chr_1_fe = state.chr_1_fe;
                self.latch_0.store(state.latch_0_fd, Ordering::Relaxed);
                self.latch_1.store(state.latch_1_fd, Ordering::Relaxed);
                self.mirroring = state.mirroring;
            }
        }
    }
}

/// Plain (Cell-free) snapshot of `Mmc2`'s register state for save states.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct Mmc2State {
    prg_bank: u8,
    chr_0_fd: u8,
    chr_0_fe: u8,
    chr_1_fd: u8,
    chr_1_fe: u8,
    latch_0_fd: bool,
    latch_1_fd: bool,
    mirroring: Mirroring,
}
