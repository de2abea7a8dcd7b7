//! Mapper 11: Color Dreams.
//!
//! The simplest of the discrete-logic 32KB/8KB switchers: a single write to
//! anywhere in $8000-$FFFF selects both the PRG-ROM bank and the CHR-ROM
//! bank in one register, no bus conflicts (unlike `GxROM`, which was built
//! by a licensed manufacturer and wired its write line through the ROM
//! data bus). Mirroring is fixed by the cartridge header.
//!
//! # Games
//!
//! - Crystal Mines
//! - Metal Fighter
//! - Many unlicensed Color Dreams titles

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Color Dreams mapper implementation (Mapper 11).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorDreams {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_banks: usize,
    chr_banks: usize,
    mirroring: Mirroring,
    prg_bank: u8,
    chr_bank: u8,
}

impl ColorDreams {
    /// Create a new Color Dreams mapper from ROM data.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let prg_banks = (rom.prg_rom.len() / 32768).max(1);
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0u8; 8192]
        } else {
            rom.chr_rom.clone()
        };
        let chr_banks = (chr.len() / 8192).max(1);

        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_is_ram,
            prg_banks,
            chr_banks,
            mirroring: rom.header.mirroring,
            prg_bank: 0,
            chr_bank: 0,
        }
    }
}

impl Mapper for ColorDreams {
    fn read_prg(&self, addr: u16) -> u8 {
        if addr < 0x8000 {
            return 0;
        }
        let bank = self.prg_bank as usize % self.prg_banks;
        let offset = (addr & 0x7FFF) as usize;
        self.prg_rom.get(bank * 32768 + offset).copied().unwrap_or(0)
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        if addr < 0x8000 {
            return;
        }
        // Low 2 bits select the 32KB PRG bank, high nibble selects the 8KB
        // CHR bank (some boards only decode 2 CHR bits; we keep all 4).
        self.prg_bank = val & 0x03;
        self.chr_bank = (val >> 4) & 0x0F;
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let bank = self.chr_bank as usize % self.chr_banks;
        let offset = (addr & 0x1FFF) as usize;
        self.chr.get(bank * 8192 + offset).copied().unwrap_or(0)
    }

    fn write_chr(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let bank = self.chr_bank as usize % self.chr_banks;
            let offset = bank * 8192 + (addr & 0x1FFF) as usize;
            if let Some(byte) = self.chr.get_mut(offset) {
                *byte = val;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u16 {
        11
    }

    fn mapper_name(&self) -> &'static str {
        "Color Dreams"
    }

    fn snapshot(&self) -> MapperSnapshot {
        let data = {
            #[cfg(feature = "serde")]
            {
                bincode::serialize(self).unwrap_or_default()
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
            if let Ok(state) = bincode::deserialize::<Self>(&_snapshot.data) {
                *self = state;
            }
        }
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
        self.chr_bank = 0;
    }
}
