//! NES System Bus Implementation.
//!
//! The bus connects the CPU to all other components:
//! - PPU registers ($2000-$2007, mirrored every 8 bytes to $3FFF)
//! - APU/IO registers ($4000-$4017)
//! - Cartridge space ($4020-$FFFF)
//! - Internal RAM ($0000-$07FF, mirrored to $1FFF)

use nesc_apu::Apu;
use nesc_cpu::Bus;
use nesc_mappers::Mapper;
use nesc_ppu::Ppu;

use crate::input::Zapper;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

/// Converts a mapper's mirroring mode to the PPU's own `Mirroring` type.
///
/// `nesc-mappers` and `nesc-ppu` are independent crates and each define their
/// own `Mirroring` enum rather than one depending on the other; the bus is
/// the integration point that translates between them.
fn to_ppu_mirroring(mirroring: nesc_mappers::Mirroring) -> nesc_ppu::Mirroring {
    match mirroring {
        nesc_mappers::Mirroring::Horizontal => nesc_ppu::Mirroring::Horizontal,
        nesc_mappers::Mirroring::Vertical => nesc_ppu::Mirroring::Vertical,
        nesc_mappers::Mirroring::SingleScreenLower => nesc_ppu::Mirroring::SingleScreenLower,
        nesc_mappers::Mirroring::SingleScreenUpper => nesc_ppu::Mirroring::SingleScreenUpper,
        nesc_mappers::Mirroring::FourScreen => nesc_ppu::Mirroring::FourScreen,
    }
}

/// Controller input state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ControllerState {
    /// Button states: A, B, Select, Start, Up, Down, Left, Right
    pub buttons: u8,
}

impl ControllerState {
    /// A button mask.
    pub const A: u8 = 0x01;
    /// B button mask.
    pub const B: u8 = 0x02;
    /// Select button mask.
    pub const SELECT: u8 = 0x04;
    /// Start button mask.
    pub const START: u8 = 0x08;
    /// Up button mask.
    pub const UP: u8 = 0x10;
    /// Down button mask.
    pub const DOWN: u8 = 0x20;
    /// Left button mask.
    pub const LEFT: u8 = 0x40;
    /// Right button mask.
    pub const RIGHT: u8 = 0x80;
}

/// NES system bus connecting all components.
///
/// The PPU owns its own nametable and palette RAM internally; the bus only
/// needs to route pattern-table ($0000-$1FFF) accesses to the cartridge
/// mapper, which it does via closures passed into the PPU's register/step
/// methods.
pub struct NesBus {
    /// Internal RAM (2KB, mirrored 4 times).
    pub ram: [u8; 2048],
    /// PPU (Picture Processing Unit).
    pub ppu: Ppu,
    /// APU (Audio Processing Unit).
    pub apu: Apu,
    /// Cartridge mapper.
    pub mapper: Box<dyn Mapper>,
    /// Controller 1 state.
    pub controller1: ControllerState,
    /// Controller 2 state.
    pub controller2: ControllerState,
    /// Zapper light gun, riding on controller port 2. `None` when not
    /// connected; a game polling `$4017` with no Zapper attached just sees
    /// the standard controller 2 shift register, same as real hardware with
    /// an empty port.
    pub zapper: Option<Zapper>,
    /// Controller 1 shift register.
    controller1_shift: u8,
    /// Controller 2 shift register.
    controller2_shift: u8,
    /// Controller strobe latch.
    controller_strobe: bool,
    /// OAM DMA page.
    oam_dma_page: Option<u8>,
    /// CPU cycle counter for DMA timing.
    cpu_cycles: u64,
    /// DMC DMA stall cycles.
    dmc_stall_cycles: u8,
    /// Last value on the data bus (for open bus behavior).
    last_bus_value: u8,
    /// NMI pending from PPU.
    nmi_pending: bool,
    /// IRQ pending from mapper/APU.
    irq_pending: bool,
    /// Sample accumulator for downsampling.
    sample_count: u32,
    /// Sample sum for averaging.
    sample_sum: f32,
    /// PPU scanline observed on the previous `step_ppu` call, to notify the
    /// mapper exactly once per scanline (e.g. MMC5's scanline IRQ).
    last_scanline: u16,
    /// RAM pattern reapplied on `reset()` (soft reset does not re-power RAM
    /// on real hardware, but the RAM content a reset starts from should
    /// still follow the same configuration it was built with).
    ram_fill: crate::config::RamFillPattern,
}

impl NesBus {
    /// CPU cycles per audio sample (at 44100 Hz).
    const CYCLES_PER_SAMPLE: u32 = 40; // ~1789773 / 44100

    /// Create a new NES bus with the given mapper, NTSC timing, zeroed RAM,
    /// and no Zapper connected.
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Self::with_config(mapper, &crate::config::Config::default())
    }

    /// Create a new NES bus configured per [`crate::Config`]: PAL/NTSC PPU
    /// timing, power-on RAM content, and whether a Zapper is connected.
    pub fn with_config(mapper: Box<dyn Mapper>, config: &crate::config::Config) -> Self {
        let ppu = match config.tv_system {
            crate::config::TvSystem::Ntsc => Ppu::new(to_ppu_mirroring(mapper.mirroring())),
            crate::config::TvSystem::Pal => Ppu::new_pal(to_ppu_mirroring(mapper.mirroring())),
        };
        let mut ram = [0u8; 2048];
        config.ram_fill.fill(&mut ram);

        Self {
            ram,
            ppu,
            apu: Apu::new(),
            mapper,
            controller1: ControllerState::default(),
            controller2: ControllerState::default(),
            zapper: config.zapper.enabled.then(Zapper::new),
            controller1_shift: 0,
            controller2_shift: 0,
            controller_strobe: false,
            oam_dma_page: None,
            cpu_cycles: 0,
            dmc_stall_cycles: 0,
            last_bus_value: 0,
            nmi_pending: false,
            irq_pending: false,
            sample_count: 0,
            sample_sum: 0.0,
            last_scanline: 0,
            ram_fill: config.ram_fill,
        }
    }

    /// Reset the bus and all components.
    pub fn reset(&mut self) {
        self.ram_fill.fill(&mut self.ram);
        self.ppu.reset();
        self.apu.reset();
        self.mapper.reset();
        self.ppu.set_mirroring(to_ppu_mirroring(self.mapper.mirroring()));
        self.controller1_shift = 0;
        self.controller2_shift = 0;
        self.controller_strobe = false;
        self.oam_dma_page = None;
        self.cpu_cycles = 0;
        self.dmc_stall_cycles = 0;
        self.last_bus_value = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.sample_count = 0;
        self.sample_sum = 0.0;
        self.last_scanline = 0;
    }

    /// Capture PPU/APU/mapper/controller state for a save state. RAM is
    /// cloned directly by the caller (`Console::snapshot`) since it lives
    /// on `NesBus` itself; CPU state lives on `Console`, not the bus.
    pub fn snapshot_components(&self) -> (nesc_ppu::Ppu, nesc_apu::Apu, nesc_mappers::MapperSnapshot) {
        (self.ppu.clone(), self.apu.clone(), self.mapper.snapshot())
    }

    /// Restore PPU/APU/mapper state previously produced by
    /// `snapshot_components`. The mapper's own mirroring is re-applied to
    /// the PPU afterward since restoring bank registers can change it.
    pub fn restore_components(
        &mut self,
        ppu: nesc_ppu::Ppu,
        apu: nesc_apu::Apu,
        mapper: &nesc_mappers::MapperSnapshot,
    ) {
        self.ppu = ppu;
        self.apu = apu;
        self.mapper.restore(mapper);
        self.ppu.set_mirroring(to_ppu_mirroring(self.mapper.mirroring()));
    }

    /// Check if OAM DMA is pending.
    #[must_use]
    pub fn oam_dma_pending(&self) -> bool {
        self.oam_dma_page.is_some()
    }

    /// Execute OAM DMA transfer.
    ///
    /// Returns the number of CPU cycles consumed.
    pub fn execute_oam_dma(&mut self) -> u16 {
        if let Some(page) = self.oam_dma_page.take() {
            let base = u16::from(page) << 8;

            // Gather 256 bytes, then hand them to the PPU as one OAM DMA transfer.
            let mut data = [0u8; 256];
            for (i, slot) in data.iter_mut().enumerate() {
                *slot = self.cpu_read(base.wrapping_add(i as u16));
            }
            self.ppu.oam_dma(&data);

            // DMA takes 513 or 514 cycles depending on CPU cycle parity
            let cycles = if self.cpu_cycles % 2 == 1 { 514 } else { 513 };
            self.cpu_cycles += u64::from(cycles);
            cycles
        } else {
            0
        }
    }

    /// Internal CPU read without updating bus state (for DMA).
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x8000..=0xFFFF => self.mapper.read_prg(addr),
            _ => 0,
        }
    }

    /// Step the PPU by 3 dots (one CPU cycle worth).
    ///
    /// Returns true if NMI should be triggered.
    /// Steps the PPU 3 dots for every CPU cycle, the NTSC PPU:CPU clock
    /// ratio. PAL's true ratio is 3.2:1; this crate's PAL mode reuses the
    /// NTSC per-cycle dot count (configuring only scanline count and
    /// odd-frame skip in [`nesc_ppu::Ppu::new_pal`]), which is an
    /// approximation rather than a fractional-accumulator PAL PPU clock.
    pub fn step_ppu(&mut self) -> bool {
        let mut nmi = false;
        let mut a12_edges = 0u8;
        let mapper = &self.mapper;

        for _ in 0..3 {
            let (_frame_complete, nmi_triggered, a12_rising) = self
                .ppu
                .step_with_chr_and_nt(|addr| mapper.read_chr(addr), |addr| mapper.nametable_override(addr));
            if nmi_triggered {
                nmi = true;
            }
            if a12_rising {
                a12_edges += 1;
            }
        }

        for _ in 0..a12_edges {
            self.mapper.ppu_a12_rising();
        }

        // Notify the mapper once per scanline transition while rendering is
        // active. MMC3 clocks its IRQ from A12 edges above; this hook exists
        // for mappers (MMC5) whose scanline counter is not A12-driven.
        let scanline = self.ppu.scanline();
        if scanline != self.last_scanline && self.ppu.rendering_enabled() {
            self.mapper.scanline();
        }
        self.last_scanline = scanline;

        // Clock the mapper for each CPU cycle
        self.mapper.clock(1);

        if nmi {
            self.nmi_pending = true;
        }

        nmi
    }

    /// Step the APU by one CPU cycle.
    ///
    /// Returns audio sample if available.
    pub fn step_apu(&mut self) -> Option<f32> {
        self.apu.clock();

        if let Some(zapper) = &mut self.zapper {
            zapper.tick();
        }

        // Handle DMC sample fetch
        if self.apu.dmc_needs_sample() {
            let addr = self.apu.dmc_sample_addr();
            let sample = self.mapper.read_prg(addr);
            self.apu.dmc_fill_sample(sample);
            // DMC DMA stalls CPU for 4 cycles
            self.dmc_stall_cycles = 4;
        }

        // Accumulate samples for downsampling; mapper expansion audio (MMC5's
        // extra pulses/PCM, etc.) mixes in alongside the five native channels.
        self.sample_sum += self.apu.output() + self.mapper.expansion_audio();
        self.sample_count += 1;

        if self.sample_count >= Self::CYCLES_PER_SAMPLE {
            #[allow(clippy::cast_precision_loss)]
            let sample = self.sample_sum / self.sample_count as f32;
            self.sample_count = 0;
            self.sample_sum = 0.0;
            Some(sample)
        } else {
            None
        }
    }

    /// Check if NMI is pending.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Acknowledge NMI.
    pub fn acknowledge_nmi(&mut self) {
        self.nmi_pending = false;
    }

    /// Check if IRQ is pending.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending || self.mapper.irq_pending() || self.apu.irq_pending()
    }

    /// Acknowledge mapper IRQ.
    pub fn acknowledge_mapper_irq(&mut self) {
        self.mapper.irq_acknowledge();
    }

    /// Get the current CPU cycle count.
    #[must_use]
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// Increment CPU cycle count.
    pub fn add_cpu_cycles(&mut self, cycles: u8) {
        self.cpu_cycles += u64::from(cycles);
    }

    /// Read controller register.
    fn read_controller(&mut self, port: u8) -> u8 {
        let shift = if port == 0 {
            &mut self.controller1_shift
        } else {
            &mut self.controller2_shift
        };

        // Open bus behavior: bits 5-7 come from last bus value
        let open_bus = self.last_bus_value & 0xE0;

        // Read bit 0 from shift register
        let mut data = (*shift & 1) | open_bus;
        *shift >>= 1;
        *shift |= 0x80; // Shift in 1s after all buttons read

        if port == 1 {
            // Bits 3-4 float high when nothing is plugged into the expansion
            // port, same as a connected-but-idle Zapper reads them.
            data |= self.zapper.as_ref().map_or(0x18, Zapper::read_bits);
        }

        data
    }

    /// Write controller strobe.
    fn write_controller_strobe(&mut self, val: u8) {
        let new_strobe = val & 1 != 0;

        // On falling edge (strobe 1->0), latch controller state
        if self.controller_strobe && !new_strobe {
            self.controller1_shift = self.controller1.buttons;
            self.controller2_shift = self.controller2.buttons;
        }

        self.controller_strobe = new_strobe;

        // While strobe is high, continuously reload
        if self.controller_strobe {
            self.controller1_shift = self.controller1.buttons;
            self.controller2_shift = self.controller2.buttons;
        }
    }

    /// Check if DMC stall is active.
    #[must_use]
    pub fn dmc_stall_active(&self) -> bool {
        self.dmc_stall_cycles > 0
    }

    /// Decrement DMC stall counter.
    pub fn decrement_dmc_stall(&mut self) {
        if self.dmc_stall_cycles > 0 {
            self.dmc_stall_cycles -= 1;
        }
    }

    /// Peek at memory without side effects.
    ///
    /// This is useful for debugging/display purposes where we don't want
    /// to trigger PPU register side effects or mapper state changes.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored every 2KB)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            // PPU registers - return last bus value to avoid side effects
            0x2000..=0x3FFF => self.last_bus_value,

            // APU and I/O registers
            0x4000..=0x4017 => match addr {
                0x4015 => self.apu.peek_status(),
                0x4016 | 0x4017 => self.last_bus_value,
                _ => self.last_bus_value,
            },

            // APU test mode
            0x4018..=0x401F => self.last_bus_value,

            // Cartridge space
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        }
    }
}

/// CPU bus implementation.
impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            // Internal RAM (mirrored every 2KB)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            // PPU registers (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let mapper = &self.mapper;
                self.ppu.read_register(addr, |a| mapper.read_chr(a))
            }

            // APU and I/O registers
            0x4000..=0x4017 => match addr {
                0x4015 => self.apu.read_status(),
                0x4016 => self.read_controller(0),
                0x4017 => self.read_controller(1),
                _ => self.last_bus_value, // Write-only registers
            },

            // APU test mode (normally disabled)
            0x4018..=0x401F => self.last_bus_value,

            // Cartridge space
            0x4020..=0xFFFF => self.mapper.read_prg(addr),
        };

        self.last_bus_value = value;
        value
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.last_bus_value = val;

        match addr {
            // Internal RAM (mirrored every 2KB)
            0x0000..=0x1FFF => {
                self.ram[(addr & 0x07FF) as usize] = val;
            }

            // PPU registers (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let mapper = &mut self.mapper;
                self.ppu
                    .write_register(addr, val, |a, v| mapper.write_chr(a, v));
            }

            // APU and I/O registers
            0x4000..=0x4017 => match addr {
                0x4000..=0x4013 | 0x4015 | 0x4017 => {
                    self.apu.write(addr, val);
                }
                0x4014 => {
                    // OAM DMA
                    self.oam_dma_page = Some(val);
                }
                0x4016 => {
                    self.write_controller_strobe(val);
                }
                _ => {}
            },

            // APU test mode (normally disabled)
            0x4018..=0x401F => {}

            // Cartridge space
            0x4020..=0xFFFF => {
                self.mapper.write_prg(addr, val);
                // Mapper registers can change mirroring at any time (MMC1, UxROM
                // single-screen switches, etc.); keep the PPU's copy in sync.
                self.ppu.set_mirroring(to_ppu_mirroring(self.mapper.mirroring()));
            }
        }
    }
}
