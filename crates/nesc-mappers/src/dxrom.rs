//! Mapper 206: `DxROM` / Namco 108 (and its `MIMIC`-1 cousin).
//!
//! `DxROM` is the discrete-logic ancestor of MMC3: the same eight-register
//! CHR/PRG bank-select protocol at $8000/$8001, but without the scanline
//! IRQ, PRG mode bit, CHR A12 inversion, mirroring register, or PRG-RAM.
//! Mirroring is fixed by the cartridge's nametable wiring, same as NROM.
//!
//! # Bank Configuration
//!
//! - Two 8KB PRG-ROM banks, switchable at $8000 and $A000; $C000 and $E000
//!   are fixed to the second-to-last and last bank.
//! - Two 2KB + four 1KB CHR banks, same register layout as MMC3 without
//!   A12 inversion.
//!
//! # Games
//!
//! - Dragon Ball Z II/III
//! - Namco's in-house PCB for various licensees

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `DxROM` mapper implementation (Mapper 206).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DxRom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_banks: usize,
    chr_banks: usize,

    bank_select: u8,
    chr_bank_2k_0: u8,
    chr_bank_2k_1: u8,
    chr_bank_1k_0: u8,
    chr_bank_1k_1: u8,
    chr_bank_1k_2: u8,
    chr_bank_1k_3: u8,
    prg_bank_0: u8,
    prg_bank_1: u8,

    mirroring: Mirroring,
}

impl DxRom {
    /// Create a new `DxROM` mapper from ROM data.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let prg_banks = (rom.prg_rom.len() / 8192).max(1);
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0u8; 8192]
        } else {
            rom.chr_rom.clone()
        };
        let chr_banks = (chr.len() / 1024).max(1);

        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            chr_is_ram,
            prg_banks,
            chr_banks,
            bank_select: 0,
            chr_bank_2k_0: 0,
            chr_bank_2k_1: 2,
            chr_bank_1k_0: 4,
            chr_bank_1k_1: 5,
            chr_bank_1k_2: 6,
            chr_bank_1k_3: 7,
            prg_bank_0: 0,
            prg_bank_1: 1,
            mirroring: rom.header.mirroring,
        }
    }

    fn prg_addr(&self, addr: u16) -> usize {
        let bank = match addr {
            0x8000..=0x9FFF => self.prg_bank_0 as usize,
            0xA000..=0xBFFF => self.prg_bank_1 as usize,
            0xC000..=0xDFFF => self.prg_banks.saturating_sub(2),
            0xE000..=0xFFFF => self.prg_banks.saturating_sub(1),
            _ => 0,
        };
        let bank = bank % self.prg_banks.max(1);
        bank * 8192 + (addr & 0x1FFF) as usize
    }

    fn chr_addr(&self, addr: u16) -> usize {
        let addr = addr & 0x1FFF;
        match addr {
            0x0000..=0x07FF => {
                let bank = (self.chr_bank_2k_0 & 0xFE) as usize % self.chr_banks;
                (bank / 2 * 2) * 1024 + (addr & 0x07FF) as usize
            }
            0x0800..=0x0FFF => {
                let bank = (self.chr_bank_2k_1 & 0xFE) as usize % self.chr_banks;
                (bank / 2 * 2) * 1024 + (addr & 0x07FF) as usize
            }
            0x1000..=0x13FF => (self.chr_bank_1k_0 as usize % self.chr_banks) * 1024 + (addr & 0x03FF) as usize,
            0x1400..=0x17FF => (self.chr_bank_1k_1 as usize % self.chr_banks) * 1024 + (addr & 0x03FF) as usize,
            0x1800..=0x1BFF => (self.chr_bank_1k_2 as usize % self.chr_banks) * 1024 + (addr & 0x03FF) as usize,
            0x1C00..=0x1FFF => (self.chr_bank_1k_3 as usize % self.chr_banks) * 1024 + (addr & 0x03FF) as usize,
            _ => 0,
        }
    }
}

impl Mapper for DxRom {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_addr(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        if !(0x8000..=0xFFFF).contains(&addr) {
            return;
        }
        if addr & 1 == 0 {
            self.bank_select = val & 0x07;
        } else {
            match self.bank_select {
                0 => self.chr_bank_2k_0 = val,
                1 => self.chr_bank_2k_1 = val,
                2 => self.chr_bank_1k_0 = val,
                3 => self.chr_bank_1k_1 = val,
                4 => self.chr_bank_1k_2 = val,
                5 => self.chr_bank_1k_3 = val,
                6 => self.prg_bank_0 = val & 0x0F,
                7 => self.prg_bank_1 = val & 0x0F,
                _ => {}
            }
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr.get(self.chr_addr(addr)).copied().unwrap_or(0)
    }

    fn write_chr(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let offset = self.chr_addr(addr);
            if let Some(byte) = self.chr.get_mut(offset) {
                *byte = val;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u16 {
        206
    }

    fn mapper_name(&self) -> &'static str {
        "DxROM"
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
        self.bank_select = 0;
        self.chr_bank_2k_0 = 0;
        self.chr_bank_2k_1 = 2;
        self.chr_bank_1k_0 = 4;
        self.chr_bank_1k_1 = 5;
        self.chr_bank_1k_2 = 6;
        self.chr_bank_1k_3 = 7;
        self.prg_bank_0 = 0;
        self.prg_bank_1 = 1;
    }
}
