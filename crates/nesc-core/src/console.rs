//! NES Console Implementation.
//!
//! The Console struct provides the high-level emulation API, managing the
//! CPU, PPU, APU, and mapper integration with proper timing.

use crate::bus::{ControllerState, NesBus};
use crate::save_state::{SaveState, SaveStateError};
use nesc_cpu::Cpu;
use nesc_mappers::{Mapper, Rom, RomError, create_mapper};

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, format, vec::Vec};
#[cfg(feature = "std")]
use std::format;

/// NES emulation timing constants.
pub mod timing {
    /// Master clock frequency (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency (NTSC).
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU clock frequency (NTSC).
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles per frame (NTSC).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// PPU dots per scanline.
    pub const PPU_DOTS_PER_SCANLINE: u16 = 341;
    /// Total scanlines (including vblank).
    pub const PPU_SCANLINES: u16 = 262;
    /// Target frame rate (NTSC).
    pub const FRAME_RATE_NTSC: f64 = 60.0988;

    /// Master clock frequency (PAL).
    pub const MASTER_CLOCK_PAL: u32 = 26_601_712;
    /// CPU clock frequency (PAL).
    pub const CPU_CLOCK_PAL: u32 = MASTER_CLOCK_PAL / 16;
    /// PPU clock frequency (PAL).
    pub const PPU_CLOCK_PAL: u32 = MASTER_CLOCK_PAL / 5;
    /// CPU cycles per frame (PAL, approximate — PAL's extra vblank lines
    /// and lack of odd-frame dot skip make this a slightly coarser figure
    /// than the NTSC constant).
    pub const CPU_CYCLES_PER_FRAME_PAL: u32 = 33_247;
    /// Total scanlines (PAL, including the longer vblank period).
    pub const PPU_SCANLINES_PAL: u16 = 312;
    /// Target frame rate (PAL).
    pub const FRAME_RATE_PAL: f64 = 50.0070;
}

/// Console error type.
#[derive(Debug, Clone)]
pub enum ConsoleError {
    /// ROM loading error.
    RomError(RomError),
    /// Save state version/ROM mismatch or corruption.
    SaveStateError(SaveStateError),
    /// Invalid state.
    InvalidState(String),
}

impl From<RomError> for ConsoleError {
    fn from(err: RomError) -> Self {
        Self::RomError(err)
    }
}

impl From<SaveStateError> for ConsoleError {
    fn from(err: SaveStateError) -> Self {
        Self::SaveStateError(err)
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RomError(e) => write!(f, "ROM error: {e}"),
            Self::SaveStateError(e) => write!(f, "save state error: {e}"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConsoleError {}

/// NES console emulator.
pub struct Console {
    /// 6502 CPU.
    cpu: Cpu,
    /// System bus (PPU, APU, mapper, RAM).
    bus: NesBus,
    /// Frame buffer (256x240 RGBA).
    framebuffer: Vec<u8>,
    /// Audio sample buffer.
    audio_buffer: Vec<f32>,
    /// Total CPU cycles executed.
    total_cycles: u64,
    /// Frame counter.
    frame_count: u64,
    /// Is emulation running?
    running: bool,
    /// CRC32 of the loaded ROM's PRG+CHR data, used to validate save states
    /// against the cartridge currently inserted. Zero when the console was
    /// built directly from a mapper rather than `Rom::load`.
    rom_crc32: u32,
}

impl Console {
    /// Create a new console with the given ROM.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        Self::with_config(rom_data, &crate::config::Config::default())
    }

    /// Create a new console with the given ROM and run configuration
    /// (TV system, RAM fill pattern, Zapper connection).
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn with_config(
        rom_data: &[u8],
        config: &crate::config::Config,
    ) -> Result<Self, ConsoleError> {
        let rom = Rom::load(rom_data)?;
        let rom_crc32 = rom.crc32();
        let mapper = create_mapper(&rom)?;
        let mut console = Self::with_mapper_and_config(mapper, config)?;
        console.rom_crc32 = rom_crc32;
        Ok(console)
    }

    /// Create a new console from ROM bytes (alias for `new`).
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        Self::new(rom_data)
    }

    /// Create a new console from ROM bytes with sample rate configuration.
    ///
    /// Note: The sample rate is currently unused as the APU handles resampling internally.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes_with_sample_rate(
        rom_data: &[u8],
        _sample_rate: u32,
    ) -> Result<Self, ConsoleError> {
        Self::new(rom_data)
    }

    /// Create a console with a pre-created mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the console cannot be initialized.
    pub fn with_mapper(mapper: Box<dyn Mapper>) -> Result<Self, ConsoleError> {
        Self::with_mapper_and_config(mapper, &crate::config::Config::default())
    }

    /// Create a console with a pre-created mapper and run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the console cannot be initialized.
    pub fn with_mapper_and_config(
        mapper: Box<dyn Mapper>,
        config: &crate::config::Config,
    ) -> Result<Self, ConsoleError> {
        let bus = NesBus::with_config(mapper, config);
        let cpu = Cpu::new();

        Ok(Self {
            cpu,
            bus,
            framebuffer: vec![0; 256 * 240 * 4],
            audio_buffer: Vec::with_capacity(2048),
            total_cycles: 0,
            frame_count: 0,
            running: true,
            rom_crc32: 0,
        })
    }

    /// Reset the console to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.reset();
        self.total_cycles = 0;
        self.running = true;
    }

    /// Power on the console (cold boot).
    pub fn power_on(&mut self) {
        self.reset();
    }

    /// Run emulation for one CPU instruction.
    ///
    /// Returns the number of CPU cycles executed.
    pub fn step(&mut self) -> u8 {
        if !self.running {
            return 0;
        }

        // Handle DMC DMA stall
        if self.bus.dmc_stall_active() {
            self.bus.decrement_dmc_stall();
            self.step_components(1);
            return 1;
        }

        // Handle OAM DMA
        if self.bus.oam_dma_pending() {
            let dma_cycles = self.bus.execute_oam_dma();
            self.step_components(dma_cycles);
            return dma_cycles as u8;
        }

        // Handle interrupts
        if self.bus.nmi_pending() {
            self.bus.acknowledge_nmi();
            self.cpu.trigger_nmi();
        }
        // The bus's combined IRQ line (mapper + APU) is level-triggered, not
        // edge-triggered, so this must track its current state every cycle —
        // only ever setting it true would leave it stuck once any source
        // fires. The CPU itself gates on the I flag when polling.
        self.cpu.set_irq(self.bus.irq_pending());

        // Execute one CPU instruction
        let cycles = self.cpu.step(&mut self.bus);
        self.step_components(u16::from(cycles));
        self.bus.add_cpu_cycles(cycles);
        self.total_cycles += u64::from(cycles);

        cycles
    }

    /// Step PPU and APU for the given number of CPU cycles.
    fn step_components(&mut self, cpu_cycles: u16) {
        for _ in 0..cpu_cycles {
            // Step PPU (3 dots per CPU cycle)
            self.bus.step_ppu();

            // Step APU (1:1 with CPU)
            if let Some(sample) = self.bus.step_apu() {
                self.audio_buffer.push(sample);
            }
        }
    }

    /// Run emulation for one frame (approximately 29,780 CPU cycles).
    ///
    /// This budgets a fixed, NTSC-derived number of CPU cycles regardless of
    /// the console's configured TV system; on a PAL console prefer
    /// [`Console::run_frame`], which tracks the PPU's own scanline
    /// transitions and is correct for both.
    ///
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame(&mut self) -> u64 {
        let start_cycles = self.total_cycles;
        let target_cycles = self.total_cycles + u64::from(timing::CPU_CYCLES_PER_FRAME);

        while self.total_cycles < target_cycles && self.running {
            self.step();
        }

        // Copy PPU framebuffer
        self.update_framebuffer();
        self.frame_count += 1;

        self.total_cycles - start_cycles
    }

    /// Run emulation for one frame with cycle-accurate timing.
    ///
    /// This is an alias for `step_frame()` for API compatibility.
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame_accurate(&mut self) -> u64 {
        self.step_frame()
    }

    /// Run one frame, stopping at the PPU's post-render-to-vblank scanline
    /// transition (240→241) rather than a fixed CPU-cycle budget.
    ///
    /// Mapper-driven mid-frame timing changes (MMC5 split-screen raster
    /// effects, VRC4 IRQ-induced splits) can shift exactly how many CPU
    /// cycles a given frame takes; anchoring to the PPU's own vblank-start
    /// transition keeps frame boundaries aligned with what the game itself
    /// considers "one frame" instead of drifting against it.
    ///
    /// Returns the actual number of CPU cycles executed.
    pub fn run_frame(&mut self) -> u64 {
        let start_cycles = self.total_cycles;
        let mut last_scanline = self.bus.ppu.scanline();

        while self.running {
            self.step();
            let scanline = self.bus.ppu.scanline();
            if last_scanline == 240 && scanline == 241 {
                break;
            }
            last_scanline = scanline;
        }

        self.update_framebuffer();
        self.frame_count += 1;

        self.total_cycles - start_cycles
    }

    /// Update the framebuffer from PPU output.
    fn update_framebuffer(&mut self) {
        let ppu_buffer = self.bus.ppu.frame_buffer();

        // Convert PPU palette indices to RGBA
        for (i, &palette_idx) in ppu_buffer.iter().enumerate() {
            let rgb = crate::palette::NES_PALETTE[palette_idx as usize & 0x3F];
            let offset = i * 4;
            self.framebuffer[offset] = rgb.0; // R
            self.framebuffer[offset + 1] = rgb.1; // G
            self.framebuffer[offset + 2] = rgb.2; // B
            self.framebuffer[offset + 3] = 255; // A

            if let Some(zapper) = &mut self.bus.zapper {
                #[allow(clippy::cast_possible_truncation)]
                let x = (i % crate::screen::WIDTH as usize) as u16;
                #[allow(clippy::cast_possible_truncation)]
                let y = (i / crate::screen::WIDTH as usize) as u16;
                zapper.observe_pixel(x, y, rgb);
            }
        }
    }

    /// Get the current framebuffer (256x240 RGBA).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Take the audio buffer (drains accumulated samples).
    pub fn take_audio(&mut self) -> Vec<f32> {
        core::mem::take(&mut self.audio_buffer)
    }

    /// Get the audio buffer without draining.
    #[must_use]
    pub fn audio_buffer(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Get audio samples (alias for `audio_buffer`).
    #[must_use]
    pub fn audio_samples(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Clear the audio sample buffer.
    pub fn clear_audio_samples(&mut self) {
        self.audio_buffer.clear();
    }

    /// Press or release a single button on controller 1.
    ///
    /// Enforces d-pad mutual exclusion (see [`ControllerState::set_button`]).
    pub fn set_button_1(&mut self, button: crate::input::Button, pressed: bool) {
        self.bus.controller1.set_button(button, pressed);
    }

    /// Press or release a single button on controller 2.
    pub fn set_button_2(&mut self, button: crate::input::Button, pressed: bool) {
        self.bus.controller2.set_button(button, pressed);
    }

    /// Is a Zapper currently connected to controller port 2?
    #[must_use]
    pub fn zapper_connected(&self) -> bool {
        self.bus.zapper.is_some()
    }

    /// Connect or disconnect the Zapper on controller port 2.
    ///
    /// Connecting resets its aim and trigger state; disconnecting drops it
    /// entirely, same as unplugging the peripheral.
    pub fn connect_zapper(&mut self, connected: bool) {
        self.bus.zapper = connected.then(crate::input::Zapper::new);
    }

    /// Current Zapper aim point in screen-space pixels, if connected and
    /// aimed on-screen.
    #[must_use]
    pub fn zapper_pos(&self) -> Option<(u16, u16)> {
        self.bus.zapper.as_ref().and_then(crate::input::Zapper::position)
    }

    /// Point the Zapper at a screen-space pixel. No-op if not connected.
    pub fn aim_zapper(&mut self, x: u16, y: u16) {
        if let Some(zapper) = &mut self.bus.zapper {
            zapper.aim(Some((x, y)));
        }
    }

    /// Pull the Zapper's trigger. No-op if not connected.
    pub fn trigger_zapper(&mut self) {
        if let Some(zapper) = &mut self.bus.zapper {
            zapper.pull_trigger();
        }
    }

    /// Set controller 1 state from button byte.
    pub fn set_controller_1(&mut self, buttons: u8) {
        self.bus.controller1 = ControllerState { buttons };
    }

    /// Set controller 2 state from button byte.
    pub fn set_controller_2(&mut self, buttons: u8) {
        self.bus.controller2 = ControllerState { buttons };
    }

    /// Set controller 1 state.
    pub fn set_controller1(&mut self, state: ControllerState) {
        self.bus.controller1 = state;
    }

    /// Set controller 2 state.
    pub fn set_controller2(&mut self, state: ControllerState) {
        self.bus.controller2 = state;
    }

    /// Get controller 1 state.
    #[must_use]
    pub fn controller1(&self) -> ControllerState {
        self.bus.controller1
    }

    /// Get controller 2 state.
    #[must_use]
    pub fn controller2(&self) -> ControllerState {
        self.bus.controller2
    }

    /// Get the total CPU cycles executed.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Get the frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if emulation is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pause emulation.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume emulation.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Get a reference to the CPU for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get a reference to the PPU for debugging.
    #[must_use]
    pub fn ppu(&self) -> &nesc_ppu::Ppu {
        &self.bus.ppu
    }

    /// Get a reference to the APU for debugging.
    #[must_use]
    pub fn apu(&self) -> &nesc_apu::Apu {
        &self.bus.apu
    }

    /// Get the total CPU cycles (alias for `total_cycles`).
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Peek at memory without side effects.
    ///
    /// This is useful for debugging/display purposes where we don't want
    /// to trigger PPU register side effects or mapper state changes.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Get a reference to the bus for debugging.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Get a mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Get the mapper number.
    #[must_use]
    pub fn mapper_number(&self) -> u16 {
        self.bus.mapper.mapper_number()
    }

    /// Get the mapper name.
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.bus.mapper.mapper_name()
    }

    /// Check if the ROM has battery-backed RAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.mapper.has_battery()
    }

    /// Get battery-backed RAM for saving.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.mapper.battery_ram()
    }

    /// Load battery-backed RAM.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.bus.mapper.set_battery_ram(data);
    }

    /// CRC32 of the loaded ROM's PRG+CHR data.
    ///
    /// Zero if this console was built via [`Console::with_mapper`] rather
    /// than from raw ROM bytes, since no `Rom` was available to hash.
    #[must_use]
    pub fn rom_crc32(&self) -> u32 {
        self.rom_crc32
    }

    /// Capture a complete, versioned snapshot of console state.
    #[must_use]
    pub fn snapshot(&self) -> SaveState {
        let (ppu, apu, mapper) = self.bus.snapshot_components();
        SaveState {
            version: crate::save_state::SAVE_STATE_VERSION,
            rom_crc32: self.rom_crc32,
            cpu: self.cpu.clone(),
            ppu,
            apu,
            mapper,
            ram: self.bus.ram.to_vec(),
            controller1: self.bus.controller1,
            controller2: self.bus.controller2,
            zapper: self.bus.zapper,
        }
    }

    /// Restore console state from a snapshot previously produced by
    /// [`Console::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`SaveStateError::VersionMismatch`] or
    /// [`SaveStateError::RomMismatch`] if the snapshot does not apply to the
    /// currently loaded ROM, and [`SaveStateError::Corrupt`] if the RAM
    /// payload is the wrong size.
    pub fn restore(&mut self, state: &SaveState) -> Result<(), SaveStateError> {
        state.validate(self.rom_crc32)?;

        if state.ram.len() != self.bus.ram.len() {
            return Err(SaveStateError::Corrupt(format!(
                "expected {} bytes of RAM, snapshot has {}",
                self.bus.ram.len(),
                state.ram.len()
            )));
        }

        self.cpu = state.cpu.clone();
        self.bus.ram.copy_from_slice(&state.ram);
        self.bus
            .restore_components(state.ppu.clone(), state.apu.clone(), &state.mapper);
        self.bus.controller1 = state.controller1;
        self.bus.controller2 = state.controller2;
        self.bus.zapper = state.zapper;

        Ok(())
    }
}
