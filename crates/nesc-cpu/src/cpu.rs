//! 6502 CPU core implementation.
//!
//! This module contains the main CPU structure with all registers, the
//! instruction execution loop, interrupt handling, and stack operations.
//!
//! Instructions execute to completion in one call to [`Cpu::step`], which
//! returns the number of cycles consumed; callers (the system bus / PPU /
//! APU) catch up by that many cycles afterward rather than being interleaved
//! cycle-by-cycle with the CPU.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::instructions::OPCODE_TABLE;
use crate::opcodes::{OPCODE_TABLE as OPCODE_INFO, OpcodeInfo};
use crate::status::Status;
use crate::vectors;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bitset of independent sources that can assert the CPU's level-triggered
    /// IRQ line. A single `bool` loses information when two sources assert and
    /// deassert independently (frame counter and mapper IRQ lines do exactly
    /// this), so each source tracks its own bit and the line stays asserted
    /// until every source has cleared it.
    #[derive(Default, Serialize, Deserialize)]
    pub struct IrqSources: u8 {
        /// Mapper-generated IRQ (MMC3/MMC5 scanline counters, VRC4, FME-7).
        const MAPPER = 1 << 0;
        /// APU frame counter IRQ.
        const FRAME_COUNTER = 1 << 1;
        /// APU DMC sample-ended IRQ.
        const DMC = 1 << 2;
        /// Catch-all for callers that only track a single external line.
        const EXTERNAL = 1 << 7;
    }
}

/// A named IRQ source, used with [`Cpu::request_irq`] / [`Cpu::clear_irq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqSource {
    /// Cartridge mapper IRQ line.
    Mapper,
    /// APU frame counter IRQ.
    FrameCounter,
    /// APU DMC IRQ.
    Dmc,
    /// Generic external source for hosts that model a single IRQ line.
    External,
}

impl IrqSource {
    const fn bits(self) -> IrqSources {
        match self {
            Self::Mapper => IrqSources::MAPPER,
            Self::FrameCounter => IrqSources::FRAME_COUNTER,
            Self::Dmc => IrqSources::DMC,
            Self::External => IrqSources::EXTERNAL,
        }
    }
}

/// The two maskable/non-maskable interrupt kinds the CPU arbitrates between
/// on each instruction boundary. Reset is handled out of band via
/// [`Cpu::reset`] and is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Non-maskable interrupt (PPU vblank), always serviced.
    Nmi,
    /// Maskable interrupt, suppressed while the I status flag is set.
    Irq,
}

/// NES 6502 CPU.
///
/// Instruction-accurate (not sub-instruction-cycle-accurate) implementation
/// of the MOS 6502 as used in the NES, including the documented illegal
/// opcode set. All per-opcode timing follows the NESdev wiki.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Accumulator register.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer (points into $0100-$01FF).
    pub sp: u8,
    /// Status flags.
    pub status: Status,
    /// Total cycles executed since power-on.
    pub cycles: u64,
    /// Remaining stall cycles imposed by DMA; the bus decrements these before
    /// calling [`Cpu::step`] again.
    pub stall: u8,
    /// Set by a JAM/KIL opcode; the CPU no longer makes forward progress.
    pub jammed: bool,
    pub(crate) nmi_pending: bool,
    pub(crate) nmi_triggered: bool,
    /// Sampled "should service IRQ after this instruction" flag, latched once
    /// per instruction so a branch's extra cycle can delay servicing by one
    /// instruction, matching real polling behavior.
    pub(crate) run_irq: bool,
    pub(crate) prev_run_irq: bool,
    irq_sources: IrqSources,
    pub(crate) operand_addr: u16,
    pub(crate) operand_value: u8,
}

impl Cpu {
    /// Creates a new CPU in power-on state.
    ///
    /// A, X, Y power on to zero; SP to `$FD` (as if three bytes had already
    /// been pulled by the reset sequence); status to `$24` (I and U set).
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::POWER_ON,
            cycles: 0,
            stall: 0,
            jammed: false,
            nmi_pending: false,
            nmi_triggered: false,
            run_irq: false,
            prev_run_irq: false,
            irq_sources: IrqSources::empty(),
            operand_addr: 0,
            operand_value: 0,
        }
    }

    /// Performs a CPU reset: pulls the reset vector, sets the I flag, and
    /// drops SP by 3 (the reset sequence's three suppressed stack pushes).
    /// A, X, Y and the rest of status are left untouched, matching hardware.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.sp = self.sp.wrapping_sub(3);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::RESET);
        self.stall = 0;
        self.jammed = false;
        self.nmi_pending = false;
        self.nmi_triggered = false;
        self.irq_sources = IrqSources::empty();
        self.cycles = self.cycles.wrapping_add(7);
    }

    /// Current accumulator value (instruction bodies call this rather than
    /// reading the field directly, mirroring real datapath accessors).
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.a
    }

    /// Current status flags.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Total cycles executed since power-on.
    #[must_use]
    pub const fn get_cycles(&self) -> u64 {
        self.cycles
    }

    /// Whether the CPU has executed a JAM/KIL opcode and halted.
    #[must_use]
    pub const fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Resolved address of the current instruction's operand. Only
    /// meaningful while executing an instruction body from within
    /// [`Cpu::step`]; addressing modes with no memory operand (Implied,
    /// Accumulator) leave this at its previous value, which instruction
    /// bodies for those modes never consult.
    #[must_use]
    pub(crate) const fn operand_addr(&self) -> u16 {
        self.operand_addr
    }

    /// Edge-triggers an NMI: serviced at the next instruction boundary
    /// regardless of the I flag.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Convenience wrapper over [`Cpu::request_irq`]/[`Cpu::clear_irq`] for
    /// callers that model a single external IRQ line (e.g. a bus adapter
    /// that has already OR'd several sources together itself).
    pub fn set_irq(&mut self, active: bool) {
        if active {
            self.request_irq(IrqSource::External);
        } else {
            self.clear_irq(IrqSource::External);
        }
    }

    /// Asserts the IRQ line on behalf of `source`. Independent from every
    /// other source: clearing a different source later does not mask this
    /// one.
    pub fn request_irq(&mut self, source: IrqSource) {
        self.irq_sources.insert(source.bits());
    }

    /// Deasserts the IRQ line on behalf of `source`. The CPU's IRQ line stays
    /// asserted as long as any other source is still requesting it.
    pub fn clear_irq(&mut self, source: IrqSource) {
        self.irq_sources.remove(source.bits());
    }

    /// Whether any source is currently asserting the IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        !self.irq_sources.is_empty()
    }

    /// Sets or clears a flag. Byte in, value in: sets `flag` when `value`.
    pub(crate) fn set_zn(&mut self, value: u8) {
        self.status.set_zn(value);
    }

    /// No-op placeholder for the handful of instruction bodies (RTS/RTI/PLA/
    /// PLP/JSR/branch) that model an internal or dummy-read cycle. Total
    /// cycle counts come from [`crate::opcodes::OPCODE_TABLE`] plus the
    /// page-cross/branch adjustments computed in [`Cpu::step`], not from
    /// counting these calls, so this intentionally does nothing.
    #[allow(clippy::unused_self)]
    pub(crate) fn tick(&mut self, _bus: &mut impl Bus) {}

    /// Reads a byte through the bus.
    pub(crate) fn read_byte(&mut self, bus: &mut impl Bus, addr: u16) -> u8 {
        bus.read(addr)
    }

    /// Writes a byte through the bus.
    pub(crate) fn write_byte(&mut self, bus: &mut impl Bus, addr: u16, value: u8) {
        bus.write(addr, value);
    }

    /// Pushes a byte onto the stack.
    pub(crate) fn push_byte(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    /// Pops a byte from the stack.
    pub(crate) fn pop_byte(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    /// Pushes a 16-bit value (high byte first).
    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push_byte(bus, (value >> 8) as u8);
        self.push_byte(bus, (value & 0xFF) as u8);
    }

    /// Pops a 16-bit value (low byte first).
    pub(crate) fn pop_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pop_byte(bus);
        let hi = self.pop_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Resolves the operand address for `mode`, advancing `pc` past the
    /// operand bytes and performing any dummy bus access hardware would
    /// perform during addressing. Returns whether indexing crossed a page
    /// boundary. `forced_extra` marks opcodes (stores, read-modify-write)
    /// whose extra cycle for indexed addressing is unconditional rather than
    /// contingent on crossing, per [`OpcodeInfo::page_cross_penalty`].
    fn resolve_address(&mut self, bus: &mut impl Bus, mode: AddrMode, forced_extra: bool) -> bool {
        match mode {
            AddrMode::Imp | AddrMode::Acc => false,
            AddrMode::Imm => {
                self.operand_addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddrMode::Zp0 => {
                self.operand_addr = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddrMode::Zpx => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.operand_addr = u16::from(base.wrapping_add(self.x));
                false
            }
            AddrMode::Zpy => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.operand_addr = u16::from(base.wrapping_add(self.y));
                false
            }
            AddrMode::Rel => {
                self.operand_value = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddrMode::Abs => {
                self.operand_addr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                false
            }
            AddrMode::Ind => {
                let ptr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.operand_addr = bus.read_u16_wrap(ptr);
                false
            }
            AddrMode::Abx | AddrMode::Aby => {
                let base = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let index = if mode == AddrMode::Abx { self.x } else { self.y };
                let addr = base.wrapping_add(u16::from(index));
                let crossed = (base & 0xFF00) != (addr & 0xFF00);
                if crossed || forced_extra {
                    let uncorrected = (base & 0xFF00) | (addr & 0x00FF);
                    let _ = bus.read(uncorrected);
                }
                self.operand_addr = addr;
                crossed
            }
            AddrMode::Idx => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let ptr = zp.wrapping_add(self.x);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                self.operand_addr = u16::from_le_bytes([lo, hi]);
                false
            }
            AddrMode::Idy => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                let crossed = (base & 0xFF00) != (addr & 0xFF00);
                if crossed || forced_extra {
                    let uncorrected = (base & 0xFF00) | (addr & 0x00FF);
                    let _ = bus.read(uncorrected);
                }
                self.operand_addr = addr;
                crossed
            }
        }
    }

    /// Executes one instruction, servicing a pending interrupt first if one
    /// is asserted. Returns the number of CPU cycles consumed; the bus
    /// adapter advances the PPU and APU by this many cycles (at their fixed
    /// ratios) immediately afterward.
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        if self.stall > 0 {
            self.stall -= 1;
            self.cycles = self.cycles.wrapping_add(1);
            return 1;
        }

        if self.jammed {
            self.cycles = self.cycles.wrapping_add(1);
            return 1;
        }

        self.prev_run_irq = self.run_irq;
        self.run_irq = self.irq_pending() && !self.status.contains(Status::I);

        if let Some(interrupt) = self.pending_interrupt() {
            let cycles = self.service_interrupt(bus, interrupt);
            self.cycles = self.cycles.wrapping_add(u64::from(cycles));
            return cycles;
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let info: &OpcodeInfo = &OPCODE_INFO[opcode as usize];
        let forced_extra = info.addr_mode.is_indexed() && !info.page_cross_penalty;
        let pc_before_operand = self.pc;
        let crossed = self.resolve_address(bus, info.addr_mode, forced_extra);

        (OPCODE_TABLE[opcode as usize])(self, bus);

        let mut cycles = info.cycles;
        if info.addr_mode == AddrMode::Rel {
            if self.pc != pc_before_operand.wrapping_add(1) {
                // An untaken branch leaves PC exactly past the offset byte;
                // anything else means the branch was taken.
            }
            let taken_target = pc_before_operand.wrapping_add(1);
            if self.pc != taken_target {
                cycles += 1;
                if (taken_target & 0xFF00) != (self.pc & 0xFF00) {
                    cycles += 1;
                }
            }
        } else if crossed && info.page_cross_penalty {
            cycles += 1;
        }
        let cycles = cycles.max(1);

        self.cycles = self.cycles.wrapping_add(u64::from(cycles));
        cycles
    }

    /// The interrupt that will be serviced on the next call to
    /// [`Cpu::step`], if any. NMI always takes priority over IRQ.
    #[must_use]
    pub fn pending_interrupt(&self) -> Option<Interrupt> {
        if self.nmi_pending {
            Some(Interrupt::Nmi)
        } else if self.run_irq {
            Some(Interrupt::Irq)
        } else {
            None
        }
    }

    fn service_interrupt(&mut self, bus: &mut impl Bus, interrupt: Interrupt) -> u8 {
        self.push_word(bus, self.pc);
        let status_byte = self.status.to_stack_byte(false);
        self.push_byte(bus, status_byte);
        self.status.insert(Status::I);

        let vector = match interrupt {
            Interrupt::Nmi => {
                self.nmi_pending = false;
                self.nmi_triggered = true;
                vectors::NMI
            }
            Interrupt::Irq => vectors::IRQ,
        };
        self.pc = bus.read_u16(vector);
        7
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
