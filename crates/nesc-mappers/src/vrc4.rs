//! Konami VRC4 (Mappers 21, 22, 23, 25).
//!
//! VRC4 boards differ from each other only in which two CPU address lines
//! (A0/A1, or sometimes A0/A6, or A3/A2) are wired to the chip's internal
//! register-select pins; the register semantics -- two swappable 8KB PRG
//! banks plus two fixed, eight 1KB CHR banks written as low/high nibble
//! pairs, a mirroring register, and a scanline/cycle-mode IRQ with an
//! 8-bit up-counting prescaler -- are identical across the family. This
//! implementation decodes registers from address bits 0-1, the assignment
//! used by the VRC4b/d (mapper 25) boards; titles built for the other pin
//! assignments (21/22/23) are not separately modeled.
//!
//! # Games
//!
//! - Akumajou Densetsu (Castlevania III, Japan)
//! - Gradius II
//! - Teenage Mutant Ninja Turtles III (Japan)

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// VRC4 mapper implementation (mappers 21/22/23/25 share this core).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vrc4 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    prg_banks: usize,
    chr_banks: usize,

    prg_bank_0: u8,
    prg_bank_1: u8,
    prg_swap: bool,

    chr_bank: [u8; 8],

    mirroring: Mirroring,

    irq_latch: u8,
    irq_counter: u8,
    irq_enabled: bool,
    irq_enable_after_ack: bool,
    irq_cycle_mode: bool,
    irq_pending: bool,
    irq_prescaler: u16,

    mapper_number: u16,
}

impl Vrc4 {
    /// Create a new VRC4 mapper from ROM data for the given iNES mapper number.
    #[must_use]
    pub fn new(rom: &Rom, mapper_number: u16) -> Self {
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
            prg_ram: vec![0u8; 8192],
            prg_banks,
            chr_banks,
            prg_bank_0: 0,
            prg_bank_1: 0,
            prg_swap: false,
            chr_bank: [0; 8],
            mirroring: rom.header.mirroring,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            irq_enable_after_ack: false,
            irq_cycle_mode: false,
            irq_pending: false,
            irq_prescaler: 0,
            mapper_number,
        }
    }

    fn prg_addr(&self, addr: u16) -> usize {
        let bank = match addr {
            0x8000..=0x9FFF => {
                if self.prg_swap {
                    self.prg_banks.saturating_sub(2)
                } else {
                    self.prg_bank_0 as usize
                }
            }
            0xA000..=0xBFFF => self.prg_bank_1 as usize,
            0xC000..=0xDFFF => {
                if self.prg_swap {
                    self.prg_bank_0 as usize
                } else {
                    self.prg_banks.saturating_sub(2)
                }
            }
            0xE000..=0xFFFF => self.prg_banks.saturating_sub(1),
            _ => 0,
        };
        (bank % self.prg_banks.max(1)) * 8192 + (addr & 0x1FFF) as usize
    }

    fn chr_addr(&self, addr: u16) -> usize {
        let bank_index = (addr >> 10) as usize & 0x07;
        let bank = self.chr_bank[bank_index] as usize % self.chr_banks;
        bank * 1024 + (addr & 0x03FF) as usize
    }

    /// Register index (0-1) selected by the low address bits, the VRC4b/d
    /// (A0/A1) pin assignment.
    fn reg_select(addr: u16) -> u8 {
        (addr & 0x03) as u8
    }

    fn write_chr_nibble(&mut self, bank_index: usize, addr: u16, val: u8) {
        let reg = Self::reg_select(addr);
        let nibble = val & 0x0F;
        if reg & 0x01 == 0 {
            self.chr_bank[bank_index] = (self.chr_bank[bank_index] & 0xF0) | nibble;
        } else {
            self.chr_bank[bank_index] = (self.chr_bank[bank_index] & 0x0F) | (nibble << 4);
        }
    }

    fn reload_irq_counter(&mut self) {
        self.irq_counter = self.irq_latch;
        self.irq_prescaler = 0;
    }

    fn clock_irq_counter(&mut self) {
        let (next, overflowed) = self.irq_counter.overflowing_add(1);
        self.irq_counter = next;
        if overflowed {
            self.irq_counter = self.irq_latch;
            if self.irq_enabled {
                self.irq_pending = true;
            }
        }
    }
}

impl Mapper for Vrc4 {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                let offset = (addr - 0x6000) as usize % self.prg_ram.len().max(1);
                self.prg_ram.get(offset).copied().unwrap_or(0)
            }
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_addr(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let offset = (addr - 0x6000) as usize % self.prg_ram.len().max(1);
                if let Some(byte) = self.prg_ram.get_mut(offset) {
                    *byte = val;
                }
            }
            0x8000..=0x8FFF => self.prg_bank_0 = val & 0x1F,
            0x9000..=0x9FFF => {
                if Self::reg_select(addr) & 0x01 == 0 {
                    self.mirroring = match val & 0x03 {
                        0 => Mirroring::Vertical,
                        1 => Mirroring::Horizontal,
                        2 => Mirroring::SingleScreenLower,
                        _ => Mirroring::SingleScreenUpper,
                    };
                } else {
                    self.prg_swap = val & 0x02 != 0;
                }
            }
            0xA000..=0xAFFF => self.prg_bank_1 = val & 0x1F,
            0xB000..=0xBFFF => self.write_chr_nibble(0, addr, val),
            0xC000..=0xCFFF => self.write_chr_nibble(1, addr, val),
            0xD000..=0xDFFF => self.write_chr_nibble(2, addr, val),
            0xE000..=0xEFFF => self.write_chr_nibble(3, addr, val),
            0xF000..=0xFFFF => {
                let reg = addr & 0x3000;
                match reg {
                    0xF000 => {
                        if Self::reg_select(addr) & 0x01 == 0 {
                            self.irq_latch = (self.irq_latch & 0xF0) | (val & 0x0F);
                        } else {
                            self.irq_latch = (self.irq_latch & 0x0F) | ((val & 0x0F) << 4);
                        }
                    }
                    _ => {
                        // $F002-class register: control. $F003-class: acknowledge.
                        if addr & 0x0002 == 0 {
                            self.irq_enabled = val & 0x02 != 0;
                            self.irq_enable_after_ack = val & 0x01 != 0;
                            self.irq_cycle_mode = val & 0x04 != 0;
                            self.irq_pending = false;
                            if self.irq_enabled {
                                self.reload_irq_counter();
                            }
                        } else {
                            self.irq_pending = false;
                            self.irq_enabled = self.irq_enable_after_ack;
                        }
                    }
                }
            }
            _ => {}
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

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn irq_acknowledge(&mut self) {
        self.irq_pending = false;
    }

    fn clock(&mut self, cycles: u8) {
        if !self.irq_enabled {
            return;
        }
        for _ in 0..cycles {
            if self.irq_cycle_mode {
                self.clock_irq_counter();
            } else {
                self.irq_prescaler += 3;
                if self.irq_prescaler >= 341 {
                    self.irq_prescaler -= 341;
                    self.clock_irq_counter();
                }
            }
        }
    }

    fn mapper_number(&self) -> u16 {
        self.mapper_number
    }

    fn mapper_name(&self) -> &'static str {
        "VRC4"
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
        self.irq_enabled = false;
        self.irq_pending = false;
        self.irq_prescaler = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomHeader;

    fn test_rom() -> Rom {
        let mut prg_rom = vec![0u8; 8 * 8192];
        for bank in 0..8 {
            prg_rom[bank * 8192..(bank + 1) * 8192].fill(bank as u8);
        }
        Rom {
            header: RomHeader {
                mapper_number: 25,
                submapper: 0,
                prg_rom_size: 4,
                chr_rom_size: 1,
                prg_ram_size: 8192,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
            
            },
            prg_rom,
            chr_rom: vec![0u8; 8192],
            trainer: None,
        }
    }

    #[test]
    fn prg_bank_0_register() {
        let mut mapper = Vrc4::new(&test_rom(), 25);
        mapper.write_prg(0x8000, 3);
        assert_eq!(mapper.read_prg(0x8000), 3);
        // Second-to-last bank is fixed at $C000 in the default swap mode.
        assert_eq!(mapper.read_prg(0xC000), 6);
    }

    #[test]
    fn prg_swap_mode_flips_8000_and_c000() {
        let mut mapper = Vrc4::new(&test_rom(), 25);
        mapper.write_prg(0x8000, 3);
        mapper.write_prg(0x9002, 0x02); // set swap mode
        assert_eq!(mapper.read_prg(0x8000), 6);
        assert_eq!(mapper.read_prg(0xC000), 3);
    }

    #[test]
    fn chr_bank_nibble_writes() {
        let mut mapper = Vrc4::new(&test_rom(), 25);
        mapper.write_prg(0xB000, 0x05); // low nibble of CHR0
        mapper.write_prg(0xB001, 0x01); // high nibble of CHR0
        assert_eq!(mapper.chr_bank[0], 0x15);
    }

    #[test]
    fn cycle_mode_irq_fires_on_overflow() {
        let mut mapper = Vrc4::new(&test_rom(), 25);
        mapper.write_prg(0xF000, 0xFE); // latch low nibble
        mapper.write_prg(0xF001, 0x0F); // latch high nibble -> latch = 0xFE
        mapper.write_prg(0xF002, 0x06); // enable + cycle mode (bits: enable=0x02, cycle=0x04)

        mapper.clock(1);
        assert!(!mapper.irq_pending());
        mapper.clock(1);
        assert!(mapper.irq_pending());
    }
}
