//! Mapper 79: NINA-003/NINA-006 (American Video Entertainment).
//!
//! A bank-switching register decoded only on $4100-$5FFF (the cartridge
//! doesn't bother decoding the full $8000-$FFFF range the way most discrete
//! mappers do), holding a fixed 32KB PRG bank and 8KB CHR bank select in a
//! single byte. PRG-ROM itself is not banked through $8000-$FFFF at all;
//! that range just reads the fixed PRG-ROM straight through.
//!
//! # Games
//!
//! - Krazy Kreatures
//! - Deathbots
//! - F-15 City War

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// NINA-003/006 mapper implementation (Mapper 79).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Nina03 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_banks: usize,
    chr_banks: usize,
    mirroring: Mirroring,
    prg_bank: u8,
    chr_bank: u8,
}

impl Nina03 {
    /// Create a new NINA-003/006 mapper from ROM data.
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

impl Mapper for Nina03 {
    fn read_prg(&self, addr: u16) -> u8 {
        if addr < 0x8000 {
            return 0;
        }
        let bank = self.prg_bank as usize % self.prg_banks;
        let offset = (addr & 0x7FFF) as usize;
        self.prg_rom.get(bank * 32768 + offset).copied().unwrap_or(0)
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        // The register is only decoded on the cartridge's $4100-$5FFF
        // address lines, not the full PRG window.
        if !(0x4100..=0x5FFF).contains(&addr) {
            return;
        }
        self.chr_bank = val & 0x07;
        self.prg_bank = (val >> 3) & 0x01;
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
        79
    }

    fn mapper_name(&self) -> &'static str {
        "NINA-003/006"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn test_rom() -> Rom {
        let mut prg_rom = vec![0u8; 2 * 32768];
        prg_rom[0..32768].fill(0);
        prg_rom[32768..65536].fill(1);
        let mut chr_rom = vec![0u8; 8 * 8192];
        for bank in 0..8 {
            chr_rom[bank * 8192..(bank + 1) * 8192].fill(bank as u8);
        }
        Rom {
            header: RomHeader {
                mapper_number: 79,
                submapper: 0,
                prg_rom_size: 4,
                chr_rom_size: 8,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
                mirroring: Mirroring::Horizontal,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
            
            },
            prg_rom,
            chr_rom,
            trainer: None,
        }
    }

    #[test]
    fn register_ignored_outside_its_address_window() {
        let mut mapper = Nina03::new(&test_rom());
        mapper.write_prg(0x8000, 0xFF); // Outside $4100-$5FFF, should be ignored.
        assert_eq!(mapper.read_chr(0x0000), 0);
        assert_eq!(mapper.read_prg(0x8000), 0);
    }

    #[test]
    fn register_switches_prg_and_chr() {
        let mut mapper = Nina03::new(&test_rom());
        mapper.write_prg(0x4100, 0b0000_1101); // PRG bank 1, CHR bank 5
        assert_eq!(mapper.read_prg(0x8000), 1);
        assert_eq!(mapper.read_chr(0x0000), 5);
    }
}
