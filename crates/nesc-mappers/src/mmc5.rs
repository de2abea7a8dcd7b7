//! Mapper 5: MMC5 (ExROM).
//!
//! The most elaborate mapper in this pack: independent PRG/CHR bank-switch
//! granularities, a 1KB ExRAM scratchpad that can moonlight as an extra
//! nametable, a scanline IRQ driven by counting PPU rendering activity
//! rather than A12 edges, an 8x8 unsigned multiplier, a vertical split-screen
//! renderer, and two extra pulse channels plus a PCM channel.
//!
//! Games: Castlevania III (US), Just Breed, Uncharted Waters, Laser Invasion.
//!
//! # In-frame detection
//!
//! MMC5 has no direct line to "scanline 0 started". Instead it watches for
//! PPU rendering activity: the bus calls [`Mapper::scanline`] once per
//! scanline while rendering is on, and the CPU's own read of the NMI vector
//! ($FFFA) at the end of a frame's interrupt dispatch is used here as the
//! signal that the frame has ended, clearing the in-frame flag. This mirrors
//! the real chip's behavior of snooping the $FFFA/$FFFB fetch.
//!
//! # CHR bank ambiguity
//!
//! The shared `Mapper::read_chr(addr)` signature has no way to say whether
//! a $0000-$1FFF fetch is for a background tile or a sprite tile (that
//! distinction lives in *when* the PPU fetches it, not in the address).
//! Real MMC5 silicon uses the sprite register set for sprite fetches and
//! the background set for background fetches. This implementation instead
//! uses whichever of the two register sets (sprite $5120-5127, background
//! $5128-512B) was written to most recently for *all* CHR fetches -- the
//! common approximation used by lightweight software cores, and exact for
//! 8x8-sprite-mode games that only ever touch one set.

use crate::mapper::{Mapper, MapperSnapshot, Mirroring};
use crate::rom::Rom;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Which bank-register group last took a write; selects the active set for
/// every CHR fetch (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum ChrGroup {
    Sprite,
    Background,
}

/// Duty cycle waveforms for the two extra pulse channels, identical to the
/// main APU's table.
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// A simplified extra pulse channel: duty + fixed volume, no sweep or
/// envelope decay. MMC5 software almost always drives these at constant
/// volume for simple sound effects.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct ExtraPulse {
    duty: u8,
    volume: u8,
    enabled: bool,
    timer_period: u16,
    timer_counter: u16,
    sequencer: u8,
}

impl ExtraPulse {
    fn write_ctrl(&mut self, val: u8) {
        self.duty = (val >> 6) & 0x03;
        self.volume = val & 0x0F;
    }

    fn write_timer_lo(&mut self, val: u8) {
        self.timer_period = (self.timer_period & 0x0700) | u16::from(val);
    }

    fn write_timer_hi(&mut self, val: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (u16::from(val & 0x07) << 8);
        self.sequencer = 0;
    }

    fn clock(&mut self) {
        if self.timer_counter == 0 {
            self.timer_counter = self.timer_period;
            self.sequencer = (self.sequencer + 1) & 0x07;
        } else {
            self.timer_counter -= 1;
        }
    }

    fn output(&self) -> f32 {
        if !self.enabled || self.timer_period < 8 {
            return 0.0;
        }
        let bit = DUTY_TABLE[self.duty as usize][self.sequencer as usize];
        if bit == 1 {
            f32::from(self.volume) / 15.0
        } else {
            0.0
        }
    }
}

/// MMC5 mapper implementation (Mapper 5, ExROM).
///
/// `irq_pending`/`in_frame`/`scanline_counter` are atomics rather than
/// `Cell`s: `Mapper::read_prg` takes `&self` (the NMI-vector snoop needs to
/// mutate `in_frame` from there), and `Cell` is not `Sync`, which the
/// `Mapper: Send + Sync` bound requires. A single-threaded core never
/// contends on these, so `Ordering::Relaxed` throughout is sufficient.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct Mmc5 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_banks_8k: usize,
    chr_banks_1k: usize,

    prg_mode: u8,
    chr_mode: u8,
    prg_ram_protect_a: u8,
    prg_ram_protect_b: u8,

    exram_mode: u8,
    exram: Vec<u8>,
    nametable_mapping: u8,
    fill_tile: u8,
    fill_color: u8,
    mirroring: Mirroring,

    prg_ram_bank: u8,
    prg_bank_8000: u8,
    prg_bank_a000: u8,
    prg_bank_c000: u8,
    prg_bank_e000: u8,

    chr_bank_sprite: [u8; 8],
    chr_bank_bg: [u8; 4],
    chr_last_group: ChrGroup,

    vsplit_enable: bool,
    vsplit_right_side: bool,
    vsplit_tile: u8,
    vsplit_scroll: u8,
    vsplit_chr_bank: u8,

    irq_scanline_compare: u8,
    irq_enabled: bool,
    irq_pending: AtomicBool,
    in_frame: AtomicBool,
    scanline_counter: AtomicU16,

    mult_a: u8,
    mult_b: u8,

    pulse1: ExtraPulse,
    pulse2: ExtraPulse,
    pcm_irq_enabled: bool,
    pcm_value: u8,

    has_battery: bool,
}

impl Clone for Mmc5 {
    fn clone(&self) -> Self {
        Self {
            prg_rom: self.prg_rom.clone(),
            prg_ram: self.prg_ram.clone(),
            chr: self.chr.clone(),
            chr_is_ram: self.chr_is_ram,
            prg_banks_8k: self.prg_banks_8k,
            chr_banks_1k: self.chr_banks_1k,
            prg_mode: self.prg_mode,
            chr_mode: self.chr_mode,
            prg_ram_protect_a: self.prg_ram_protect_a,
            prg_ram_protect_b: self.prg_ram_protect_b,
            exram_mode: self.exram_mode,
            exram: self.exram.clone(),
            nametable_mapping: self.nametable_mapping,
            fill_tile: self.fill_tile,
            fill_color: self.fill_color,
            mirroring: self.mirroring,
            prg_ram_bank: self.prg_ram_bank,
            prg_bank_8000: self.prg_bank_8000,
            prg_bank_a000: self.prg_bank_a000,
            prg_bank_c000: self.prg_bank_c000,
            prg_bank_e000: self.prg_bank_e000,
            chr_bank_sprite: self.chr_bank_sprite,
            chr_bank_bg: self.chr_bank_bg,
            chr_last_group: self.chr_last_group,
            vsplit_enable: self.vsplit_enable,
            vsplit_right_side: self.vsplit_right_side,
            vsplit_tile: self.vsplit_tile,
            vsplit_scroll: self.vsplit_scroll,
            vsplit_chr_bank: self.vsplit_chr_bank,
            irq_scanline_compare: self.irq_scanline_compare,
            irq_enabled: self.irq_enabled,
            irq_pending: AtomicBool::new(self.irq_pending.load(Ordering::Relaxed)),
            in_frame: AtomicBool::new(self.in_frame.load(Ordering::Relaxed)),
            scanline_counter: AtomicU16::new(self.scanline_counter.load(Ordering::Relaxed)),
            mult_a: self.mult_a,
            mult_b: self.mult_b,
            pulse1: self.pulse1.clone(),
            pulse2: self.pulse2.clone(),
            pcm_irq_enabled: self.pcm_irq_enabled,
            pcm_value: self.pcm_value,
            has_battery: self.has_battery,
        }
    }
}

impl Mmc5 {
    /// Create a new MMC5 mapper from ROM data.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let prg_banks_8k = (rom.prg_rom.len() / 8192).max(1);
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0u8; 8192]
        } else {
            rom.chr_rom.clone()
        };
        let chr_banks_1k = (chr.len() / 1024).max(1);

        Self {
            prg_rom: rom.prg_rom.clone(),
            prg_ram: vec![0u8; 8 * 8192],
            chr,
            chr_is_ram,
            prg_banks_8k,
            chr_banks_1k,
            prg_mode: 3,
            chr_mode: 3,
            prg_ram_protect_a: 0,
            prg_ram_protect_b: 0,
            exram_mode: 0,
            exram: vec![0u8; 1024],
            nametable_mapping: 0,
            fill_tile: 0,
            fill_color: 0,
            mirroring: rom.header.mirroring,
            prg_ram_bank: 0,
            prg_bank_8000: 0,
            prg_bank_a000: 0,
            prg_bank_c000: 0,
            prg_bank_e000: 0x7F,
            chr_bank_sprite: [0; 8],
            chr_bank_bg: [0; 4],
            chr_last_group: ChrGroup::Sprite,
            vsplit_enable: false,
            vsplit_right_side: false,
            vsplit_tile: 0,
            vsplit_scroll: 0,
            vsplit_chr_bank: 0,
            irq_scanline_compare: 0,
            irq_enabled: false,
            irq_pending: AtomicBool::new(false),
            in_frame: AtomicBool::new(false),
            scanline_counter: AtomicU16::new(0),
            mult_a: 0,
            mult_b: 0,
            pulse1: ExtraPulse::default(),
            pulse2: ExtraPulse::default(),
            pcm_irq_enabled: false,
            pcm_value: 0,
            has_battery: rom.header.has_battery,
        }
    }

    /// Write-protect gate for PRG-RAM: both $5102 and $5103 must carry their
    /// unlock pattern or every RAM write is silently dropped.
    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_protect_a == 0x02 && self.prg_ram_protect_b == 0x01
    }

    /// Resolve a PRG bank register into (is_rom, bank index) at the window's
    /// own granularity. `$5117` is wired ROM-only on real silicon.
    fn resolve_prg_reg(reg: u8, force_rom: bool) -> (bool, usize) {
        if force_rom {
            (true, (reg & 0x7F) as usize)
        } else if reg & 0x80 != 0 {
            (true, (reg & 0x7F) as usize)
        } else {
            (false, (reg & 0x07) as usize)
        }
    }

    /// Window (register, forced-ROM, base address, length in 8KB units) for
    /// a $8000-$FFFF address under the current `prg_mode`. Mode 0's single
    /// 32KB window is always ROM, driven by $5117.
    fn prg_window(&self, addr: u16) -> (u8, bool, u16, usize) {
        match self.prg_mode {
            0 => (self.prg_bank_e000, true, 0x8000, 4),
            1 => {
                if addr < 0xC000 {
                    (self.prg_bank_a000, false, 0x8000, 2)
                } else {
                    (self.prg_bank_e000, true, 0xC000, 2)
                }
            }
            2 => {
                if addr < 0xC000 {
                    (self.prg_bank_a000, false, 0x8000, 2)
                } else if addr < 0xE000 {
                    (self.prg_bank_c000, false, 0xC000, 1)
                } else {
                    (self.prg_bank_e000, true, 0xE000, 1)
                }
            }
            _ => match addr {
                0x8000..=0x9FFF => (self.prg_bank_8000, false, 0x8000, 1),
                0xA000..=0xBFFF => (self.prg_bank_a000, false, 0xA000, 1),
                0xC000..=0xDFFF => (self.prg_bank_c000, false, 0xC000, 1),
                _ => (self.prg_bank_e000, true, 0xE000, 1),
            },
        }
    }

    /// Read the PRG byte for an address in $8000-$FFFF, honoring `prg_mode`.
    fn read_prg_rom_area(&self, addr: u16) -> u8 {
        let (reg, force_rom, base, len_8k) = self.prg_window(addr);
        let (is_rom, bank) = Self::resolve_prg_reg(reg, force_rom);
        let page = ((addr - base) / 8192) as usize;

        if is_rom {
            let base_8k = bank & !(len_8k - 1);
            let bank_8k = (base_8k + page) % self.prg_banks_8k.max(1);
            self.prg_rom
                .get(bank_8k * 8192 + (addr as usize & 0x1FFF))
                .copied()
                .unwrap_or(0)
        } else {
            let ram_bank = bank % 8;
            self.prg_ram
                .get(ram_bank * 8192 + (addr as usize & 0x1FFF))
                .copied()
                .unwrap_or(0)
        }
    }

    fn write_prg_rom_area(&mut self, addr: u16, val: u8) {
        // Only the RAM-selected windows accept writes; ROM windows ignore them.
        let (reg, force_rom, _base, _len_8k) = self.prg_window(addr);
        let (is_rom, bank) = Self::resolve_prg_reg(reg, force_rom);
        if is_rom || !self.prg_ram_writable() {
            return;
        }
        let ram_bank = bank % 8;
        let offset = (addr as usize) & 0x1FFF;
        if let Some(byte) = self.prg_ram.get_mut(ram_bank * 8192 + offset) {
            *byte = val;
        }
    }

    /// Resolve a $0000-$1FFF CHR fetch using whichever bank-register group
    /// was last written (see module docs for the approximation rationale).
    fn chr_addr(&self, addr: u16) -> usize {
        let addr = addr & 0x1FFF;
        let page_1k = (addr / 1024) as usize;

        let bank = match self.chr_last_group {
            ChrGroup::Background => {
                let set = &self.chr_bank_bg;
                match self.chr_mode {
                    0 => (set[3] as usize & !7) + page_1k,
                    1 => {
                        let reg = if page_1k < 4 { set[1] } else { set[3] };
                        (reg as usize & !3) + (page_1k % 4)
                    }
                    2 => {
                        let reg = set[page_1k / 2];
                        (reg as usize & !1) + (page_1k % 2)
                    }
                    _ => set[page_1k % 4] as usize,
                }
            }
            ChrGroup::Sprite => {
                let set = &self.chr_bank_sprite;
                match self.chr_mode {
                    0 => (set[7] as usize & !7) + page_1k,
                    1 => {
                        let reg = if page_1k < 4 { set[3] } else { set[7] };
                        (reg as usize & !3) + (page_1k % 4)
                    }
                    2 => {
                        let reg = set[page_1k / 2 * 2 + 1];
                        (reg as usize & !1) + (page_1k % 2)
                    }
                    _ => set[page_1k % 8] as usize,
                }
            }
        };

        (bank % self.chr_banks_1k) * 1024 + (addr as usize & 0x03FF)
    }

    /// Nametable quadrant (0-3) for a $2000-$2FFF PPU address.
    fn quadrant(addr: u16) -> u8 {
        ((addr >> 10) & 0x03) as u8
    }

    /// Source selector (0=NTA 1=NTB 2=ExRAM 3=Fill) for a quadrant.
    fn nt_source(&self, quadrant: u8) -> u8 {
        (self.nametable_mapping >> (quadrant * 2)) & 0x03
    }

    fn derive_mirroring(map: u8) -> Mirroring {
        let q = [map & 3, (map >> 2) & 3, (map >> 4) & 3, (map >> 6) & 3];
        if q == [0, 0, 1, 1] {
            Mirroring::Horizontal
        } else if q == [0, 1, 0, 1] {
            Mirroring::Vertical
        } else if q == [0, 0, 0, 0] {
            Mirroring::SingleScreenLower
        } else if q == [1, 1, 1, 1] {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::FourScreen
        }
    }
}

impl Mapper for Mmc5 {
    fn read_prg(&self, addr: u16) -> u8 {
        if addr == 0xFFFA || addr == 0xFFFB {
            self.in_frame.store(false, Ordering::Relaxed);
        }

        match addr {
            0x5010 => u8::from(self.pcm_irq_enabled) << 7,
            0x5015 => u8::from(self.pulse1.enabled) | (u8::from(self.pulse2.enabled) << 1),
            0x5204 => {
                let status = (u8::from(self.irq_pending.load(Ordering::Relaxed)) << 7)
                    | (u8::from(self.in_frame.load(Ordering::Relaxed)) << 6);
                self.irq_pending.store(false, Ordering::Relaxed);
                status
            }
            0x5205 => (u16::from(self.mult_a) * u16::from(self.mult_b) & 0xFF) as u8,
            0x5206 => ((u16::from(self.mult_a) * u16::from(self.mult_b)) >> 8) as u8,
            0x5C00..=0x5FFF => self.exram[(addr - 0x5C00) as usize],
            0x6000..=0x7FFF => {
                let bank = self.prg_ram_bank as usize % 8;
                self.prg_ram
                    .get(bank * 8192 + (addr - 0x6000) as usize)
                    .copied()
                    .unwrap_or(0)
            }
            0x8000..=0xFFFF => self.read_prg_rom_area(addr),
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        match addr {
            0x5000 => self.pulse1.write_ctrl(val),
            0x5002 => self.pulse1.write_timer_lo(val),
            0x5003 => self.pulse1.write_timer_hi(val),
            0x5004 => self.pulse2.write_ctrl(val),
            0x5006 => self.pulse2.write_timer_lo(val),
            0x5007 => self.pulse2.write_timer_hi(val),
            0x5010 => self.pcm_irq_enabled = val & 0x80 != 0,
            0x5011 => self.pcm_value = val,
            0x5015 => {
                self.pulse1.enabled = val & 0x01 != 0;
                self.pulse2.enabled = val & 0x02 != 0;
            }
            0x5100 => self.prg_mode = val & 0x03,
            0x5101 => self.chr_mode = val & 0x03,
            0x5102 => self.prg_ram_protect_a = val & 0x03,
            0x5103 => self.prg_ram_protect_b = val & 0x03,
            0x5104 => self.exram_mode = val & 0x03,
            0x5105 => {
                self.nametable_mapping = val;
                self.mirroring = Self::derive_mirroring(val);
            }
            0x5106 => self.fill_tile = val,
            0x5107 => self.fill_color = val & 0x03,
            0x5113 => self.prg_ram_bank = val & 0x07,
            0x5114 => self.prg_bank_8000 = val,
            0x5115 => self.prg_bank_a000 = val,
            0x5116 => self.prg_bank_c000 = val,
            0x5117 => self.prg_bank_e000 = val,
            0x5120..=0x5127 => {
                self.chr_bank_sprite[(addr - 0x5120) as usize] = val;
                self.chr_last_group = ChrGroup::Sprite;
            }
            0x5128..=0x512B => {
                self.chr_bank_bg[(addr - 0x5128) as usize] = val;
                self.chr_last_group = ChrGroup::Background;
            }
            0x5130 => {} // High CHR bank bits; unused at this ROM size.
            0x5200 => {
                self.vsplit_enable = val & 0x80 != 0;
                self.vsplit_right_side = val & 0x40 != 0;
                self.vsplit_tile = val & 0x1F;
            }
            0x5201 => self.vsplit_scroll = val,
            0x5202 => self.vsplit_chr_bank = val,
            0x5203 => self.irq_scanline_compare = val,
            0x5204 => {
                let was_enabled = self.irq_enabled;
                self.irq_enabled = val & 0x80 != 0;
                if was_enabled && !self.irq_enabled {
                    self.irq_pending.store(false, Ordering::Relaxed);
                }
            }
            0x5205 => self.mult_a = val,
            0x5206 => self.mult_b = val,
            0x5C00..=0x5FFF => {
                if self.exram_mode != 3 {
                    self.exram[(addr - 0x5C00) as usize] = val;
                }
            }
            0x6000..=0x7FFF => {
                if self.prg_ram_writable() {
                    let bank = self.prg_ram_bank as usize % 8;
                    if let Some(byte) = self.prg_ram.get_mut(bank * 8192 + (addr - 0x6000) as usize)
                    {
                        *byte = val;
                    }
                }
            }
            0x8000..=0xFFFF => self.write_prg_rom_area(addr, val),
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let offset = self.chr_addr(addr);
        self.chr.get(offset).copied().unwrap_or(0)
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
        self.irq_pending.load(Ordering::Relaxed)
    }

    fn irq_acknowledge(&mut self) {
        self.irq_pending.store(false, Ordering::Relaxed);
    }

    fn clock(&mut self, _cycles: u8) {
        self.pulse1.clock();
        self.pulse2.clock();
    }

    fn scanline(&mut self) {
        if !self.in_frame.load(Ordering::Relaxed) {
            self.in_frame.store(true, Ordering::Relaxed);
            self.scanline_counter.store(0, Ordering::Relaxed);
        } else {
            let n = self.scanline_counter.load(Ordering::Relaxed) + 1;
            self.scanline_counter.store(n, Ordering::Relaxed);
            if self.irq_enabled && self.irq_scanline_compare != 0 && n == self.irq_scanline_compare
            {
                self.irq_pending.store(true, Ordering::Relaxed);
            }
        }
    }

    fn mapper_number(&self) -> u16 {
        5
    }

    fn mapper_name(&self) -> &'static str {
        "MMC5"
    }

    fn has_battery(&self) -> bool {
        self.has_battery
    }

    fn battery_ram(&self) -> Option<&[u8]> {
        if self.has_battery {
            Some(&self.prg_ram)
        } else {
            None
        }
    }

    fn set_battery_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.prg_ram.len());
        self.prg_ram[..len].copy_from_slice(&data[..len]);
    }

    fn reset(&mut self) {
        // MMC5 keeps its bank registers across a soft reset, same as MMC3;
        // only the volatile IRQ/in-frame tracking is cleared.
        self.irq_pending.store(false, Ordering::Relaxed);
        self.in_frame.store(false, Ordering::Relaxed);
        self.scanline_counter.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MapperSnapshot {
        #[cfg(feature = "serde")]
        let data = {
            let state = Mmc5State {
                prg_ram: self.prg_ram.clone(),
                chr: if self.chr_is_ram {
                    self.chr.clone()
                } else {
                    alloc::vec::Vec::new()
                },
                prg_mode: self.prg_mode,
                chr_mode: self.chr_mode,
                prg_ram_protect_a: self.prg_ram_protect_a,
                prg_ram_protect_b: self.prg_ram_protect_b,
                exram_mode: self.exram_mode,
                exram: self.exram.clone(),
                nametable_mapping: self.nametable_mapping,
                fill_tile: self.fill_tile,
                fill_color: self.fill_color,
                mirroring: self.mirroring,
                prg_ram_bank: self.prg_ram_bank,
                prg_bank_8000: self.prg_bank_8000,
                prg_bank_a000: self.prg_bank_a000,
                prg_bank_c000: self.prg_bank_c000,
                prg_bank_e000: self.prg_bank_e000,
                chr_bank_sprite: self.chr_bank_sprite,
                chr_bank_bg: self.chr_bank_bg,
                chr_last_group: self.chr_last_group,
                vsplit_enable: self.vsplit_enable,
                vsplit_right_side: self.vsplit_right_side,
                vsplit_tile: self.vsplit_tile,
                vsplit_scroll: self.vsplit_scroll,
                vsplit_chr_bank: self.vsplit_chr_bank,
                irq_scanline_compare: self.irq_scanline_compare,
                irq_enabled: self.irq_enabled,
                irq_pending: self.irq_pending.load(Ordering::Relaxed),
                in_frame: self.in_frame.load(Ordering::Relaxed),
                scanline_counter: self.scanline_counter.load(Ordering::Relaxed),
                mult_a: self.mult_a,
                mult_b: self.mult_b,
                pulse1: self.pulse1.clone(),
                pulse2: self.pulse2.clone(),
                pcm_irq_enabled: self.pcm_irq_enabled,
                pcm_value: self.pcm_value,
            };
            bincode::serialize(&state).unwrap_or_default()
        };
        #[cfg(not(feature = "serde"))]
        let data = alloc::vec::Vec::new();

        MapperSnapshot {
            mapper_number: self.mapper_number(),
            data,
        }
    }

    fn restore(&mut self, _snapshot: &MapperSnapshot) {
        #[cfg(feature = "serde")]
        if _snapshot.mapper_number == self.mapper_number() {
            if let Ok(state) = bincode::deserialize::<Mmc5State>(&_snapshot.data) {
                self.prg_ram = state.prg_ram;
                if self.chr_is_ram && !state.chr.is_empty() {
                    self.chr = state.chr;
                }
                self.prg_mode = state.prg_mode;
                self.chr_mode = state.chr_mode;
                self.prg_ram_protect_a = state.prg_ram_protect_a;
                self.prg_ram_protect_b = state.prg_ram_protect_b;
                self.exram_mode = state.exram_mode;
                self.exram = state.exram;
                self.nametable_mapping = state.nametable_mapping;
                self.fill_tile = state.fill_tile;
                self.fill_color = state.fill_color;
                self.mirroring = state.mirroring;
                self.prg_ram_bank = state.prg_ram_bank;
                self.prg_bank_8000 = state.prg_bank_8000;
                self.prg_bank_a000 = state.prg_bank_a000;
                self.prg_bank_c000 = state.prg_bank_c000;
                self.prg_bank_e000 = state.prg_bank_e000;
                self.chr_bank_sprite = state.chr_bank_sprite;
                self.chr_bank_bg = state.chr_bank_bg;
                self.chr_last_group = state.chr_last_group;
                self.vsplit_enable = state.vsplit_enable;
                self.vsplit_right_side = state.vsplit_right_side;
                self.vsplit_tile = state.vsplit_tile;
                self.vsplit_scroll = state.vsplit_scroll;
                self.vsplit_chr_bank = state.vsplit_chr_bank;
                self.irq_scanline_compare = state.irq_scanline_compare;
                self.irq_enabled = state.irq_enabled;
                self.irq_pending.store(state.irq_pending, Ordering::Relaxed);
                self.in_frame.store(state.in_frame, Ordering::Relaxed);
                self.scanline_counter.store(state.scanline_counter, Ordering::Relaxed);
                self.mult_a = state.mult_a;
                self.mult_b = state.mult_b;
                self.pulse1 = state.pulse1;
                self.pulse2 = state.pulse2;
                self.pcm_irq_enabled = state.pcm_irq_enabled;
                self.pcm_value = state.pcm_value;
            }
        }
    }

    fn expansion_audio(&self) -> f32 {
        let pcm = f32::from(self.pcm_value) / 255.0;
        (self.pulse1.output() + self.pulse2.output() + pcm) / 3.0
    }

    fn nametable_override(&self, addr: u16) -> Option<u8> {
        let quadrant = Self::quadrant(addr);
        match self.nt_source(quadrant) {
            2 if self.exram_mode <= 1 => Some(self.exram[(addr & 0x03FF) as usize]),
            3 => Some(self.fill_tile),
            _ => None,
        }
    }

    fn nametable_write_override(&mut self, addr: u16, val: u8) -> bool {
        let quadrant = Self::quadrant(addr);
        if self.nt_source(quadrant) == 2 && self.exram_mode <= 1 {
            self.exram[(addr & 0x03FF) as usize] = val;
            true
        } else {
            false
        }
    }
}

/// Plain (Cell-free) snapshot of `Mmc5`'s register state for save states.
/// CHR is only carried when it's RAM; CHR-ROM content is never part of a
/// save state since the host already holds the cartridge image.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct Mmc5State {
    prg_ram: alloc::vec::Vec<u8>,
    chr: alloc::vec::Vec<u8>,
    prg_mode: u8,
    chr_mode: u8,
    prg_ram_protect_a: u8,
    prg_ram_protect_b: u8,
    exram_mode: u8,
    exram: alloc::vec::Vec<u8>,
    nametable_mapping: u8,
    fill_tile: u8,
    fill_color: u8,
    mirroring: Mirroring,
    prg_ram_bank: u8,
    prg_bank_8000: u8,
    prg_bank_a000: u8,
    prg_bank_c000: u8,
    prg_bank_e000: u8,
    chr_bank_sprite: [u8; 8],
    chr_bank_bg: [u8; 4],
    chr_last_group: ChrGroup,
    vsplit_enable: bool,
    vsplit_right_side: bool,
    vsplit_tile: u8,
    vsplit_scroll: u8,
    vsplit_chr_bank: u8,
    irq_scanline_compare: u8,
    irq_enabled: bool,
    irq_pending: bool,
    in_frame: bool,
    scanline_counter: u16,
    mult_a: u8,
    mult_b: u8,
    pulse1: ExtraPulse,
    pulse2: ExtraPulse,
    pcm_irq_enabled: bool,
    pcm_value: u8,
}
