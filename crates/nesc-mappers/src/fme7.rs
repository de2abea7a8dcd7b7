//! Mapper 69: Sunsoft FME-7 (and the 5B variant used for its sound chip).
//!
//! A single command/parameter register pair selects one of sixteen internal
//! registers: eight 1KB CHR banks, three swappable 8KB PRG banks plus a
//! PRG-RAM/ROM bank at $6000, a mirroring-mode register, and a free-running
//! 16-bit down-counter that raises IRQ on underflow. The last 8KB PRG bank
//! is hardwired to the top of the ROM.
//!
//! The 5B variant adds a Yamaha-style 3-channel PSG mapped at $C000/$E000;
//! it is outside the core's audio mixing chain and is not modeled here.
//!
//! # Games
//!
//! - Gimmick!
//! - Batman: Return of the Joker
//! - Hebereke

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sunsoft FME-7 mapper implementation (Mapper 69).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fme7 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    prg_banks: usize,
    chr_banks: usize,

    command: u8,
    chr_bank: [u8; 8],
    prg_bank: [u8; 3],
    /// $6000-$7FFF bank select: bit7 = RAM (vs ROM), bit6 = chip enable, bits0-5 = bank.
    prg_ram_reg: u8,

    mirroring: Mirroring,

    irq_counter: u16,
    irq_counter_enabled: bool,
    irq_enabled: bool,
    irq_pending: bool,

    has_battery: bool,
}

impl Fme7 {
    /// Create a new FME-7 mapper from ROM data.
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
            prg_ram: vec![0u8; 8192],
            prg_banks,
            chr_banks,
            command: 0,
            chr_bank: [0; 8],
            prg_bank: [0; 3],
            prg_ram_reg: 0,
            mirroring: rom.header.mirroring,
            irq_counter: 0,
            irq_counter_enabled: false,
            irq_enabled: false,
            irq_pending: false,
            has_battery: rom.header.has_battery,
        }
    }

    fn prg_addr(&self, addr: u16) -> usize {
        let bank = match addr {
            0x8000..=0x9FFF => self.prg_bank[0] as usize,
            0xA000..=0xBFFF => self.prg_bank[1] as usize,
            0xC000..=0xDFFF => self.prg_bank[2] as usize,
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

    fn write_register(&mut self, val: u8) {
        match self.command & 0x0F {
            0x0..=0x7 => self.chr_bank[(self.command & 0x07) as usize] = val,
            0x8 => self.prg_ram_reg = val,
            0x9 => self.prg_bank[0] = val & 0x3F,
            0xA => self.prg_bank[1] = val & 0x3F,
            0xB => self.prg_bank[2] = val & 0x3F,
            0xC => {
                self.mirroring = match val & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                };
            }
            0xD => {
                self.irq_enabled = val & 0x01 != 0;
                self.irq_counter_enabled = val & 0x80 != 0;
                self.irq_pending = false;
            }
            0xE => self.irq_counter = (self.irq_counter & 0xFF00) | u16::from(val),
            0xF => self.irq_counter = (self.irq_counter & 0x00FF) | (u16::from(val) << 8),
            _ => unreachable!(),
        }
    }
}

impl Mapper for Fme7 {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_reg & 0x80 != 0 {
                    if self.prg_ram_reg & 0x40 != 0 {
                        let offset = (addr - 0x6000) as usize % self.prg_ram.len().max(1);
                        self.prg_ram.get(offset).copied().unwrap_or(0)
                    } else {
                        0
                    }
                } else {
                    let bank = self.prg_ram_reg as usize & 0x3F;
                    let offset = bank * 8192 + (addr - 0x6000) as usize;
                    self.prg_rom.get(offset % self.prg_rom.len().max(1)).copied().unwrap_or(0)
                }
            }
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_addr(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_reg & 0xC0 == 0xC0 {
                    let offset = (addr - 0x6000) as usize % self.prg_ram.len().max(1);
                    if let Some(byte) = self.prg_ram.get_mut(offset) {
                        *byte = val;
                    }
                }
            }
            0x8000..=0x9FFF => self.command = val & 0x0F,
            0xA000..=0xBFFF => self.write_register(val),
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
        if !self.irq_counter_enabled {
            return;
        }
        for _ in 0..cycles {
            let (next, underflowed) = self.irq_counter.overflowing_sub(1);
            self.irq_counter = next;
            if underflowed && self.irq_enabled {
                self.irq_pending = true;
            }
        }
    }

    fn mapper_number(&self) -> u16 {
        69
    }

    fn mapper_name(&self) -> &'static str {
        "FME-7"
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

    fn has_battery(&self) -> bool {
        self.has_battery
    }

    fn battery_ram(&self) -> Option<&[u8]> {
        self.has_battery.then_some(self.prg_ram.as_slice())
    }

    fn set_battery_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.prg_ram.len());
        self.prg_ram[..len].copy_from_slice(&data[..len]);
    }

    fn reset(&mut self) {
        self.command = 0;
        self.irq_enabled = false;
        self.irq_counter_enabled = false;
        self.irq_pending = false;
    }
}
