//! Button input and the Zapper light-gun peripheral.
//!
//! The controller shift-register protocol itself (`$4016`/`$4017` strobe and
//! serial read) lives on [`crate::bus::NesBus`] — it's bus wiring, not an
//! input-layer concern. This module provides the ergonomic [`Button`] enum
//! used to mutate a [`ControllerState`], and the optional [`Zapper`]
//! peripheral that rides on controller port 2 alongside it.

use crate::bus::ControllerState;

/// NES standard controller buttons. Discriminants match
/// [`ControllerState`]'s bit layout so `button as u8` is the bitmask
/// directly.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Button {
    /// A button.
    A = ControllerState::A,
    /// B button.
    B = ControllerState::B,
    /// Select button.
    Select = ControllerState::SELECT,
    /// Start button.
    Start = ControllerState::START,
    /// D-pad up.
    Up = ControllerState::UP,
    /// D-pad down.
    Down = ControllerState::DOWN,
    /// D-pad left.
    Left = ControllerState::LEFT,
    /// D-pad right.
    Right = ControllerState::RIGHT,
}

impl ControllerState {
    /// Set or clear a single button.
    ///
    /// Pressing Up/Down or Left/Right releases the opposite direction on the
    /// same d-pad axis first: the physical d-pad cannot report both
    /// directions of an axis held at once, and a host forwarding two stale
    /// key-down events (e.g. a dropped key-up) should not desync the
    /// emulated pad into a state real hardware can never produce.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let bit = button as u8;
        if pressed {
            self.buttons |= bit;
            match button {
                Button::Up => self.buttons &= !Self::DOWN,
                Button::Down => self.buttons &= !Self::UP,
                Button::Left => self.buttons &= !Self::RIGHT,
                Button::Right => self.buttons &= !Self::LEFT,
                _ => {}
            }
        } else {
            self.buttons &= !bit;
        }
    }

    /// Check whether a button is currently held.
    #[must_use]
    pub fn button(&self, button: Button) -> bool {
        self.buttons & (button as u8) != 0
    }
}

/// CPU cycles the trigger reads as held after `Zapper::pull_trigger`, long
/// enough to span a full light-sensing frame at NTSC speed.
const TRIGGER_HOLD_CYCLES: u32 = 59_661;

/// CPU cycles the photodiode reports "lit" after a bright pixel passes
/// under the barrel, wide enough to survive the handful of cycles between
/// the beam crossing the aim point and the game polling `$4017`.
const SENSOR_LIT_CYCLES: u32 = 2_841;

/// Aim-point radius (in pixels) within which a rendered pixel can trigger
/// the light sensor.
const SENSE_RADIUS: u16 = 3;

/// Zapper connection setting for [`crate::Config`].
///
/// Separate from the live [`Zapper`] peripheral state: this just records
/// whether a game session wants one plugged in, mirroring how a real
/// player chooses a cartridge/controller combination before powering on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ZapperConfig {
    /// Whether the Zapper is connected to controller port 2.
    pub enabled: bool,
}

/// Zapper light-gun peripheral.
///
/// Modeled as two independent countdown timers rather than single-cycle
/// edges: the trigger reads held for `TRIGGER_HOLD_CYCLES` after a pull so a
/// game polling a few cycles late still sees it, and the sensor reads lit
/// for `SENSOR_LIT_CYCLES` after the beam passes a bright pixel near the aim
/// point for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Zapper {
    aim: Option<(u16, u16)>,
    trigger_cycles_remaining: u32,
    sensor_lit_cycles_remaining: u32,
}

impl Zapper {
    /// Create a Zapper aimed at no particular point, trigger released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the barrel at a screen-space pixel, or `None` to aim off-screen
    /// (always reports no light).
    pub fn aim(&mut self, position: Option<(u16, u16)>) {
        self.aim = position;
    }

    /// Current aim point, if any.
    #[must_use]
    pub fn position(&self) -> Option<(u16, u16)> {
        self.aim
    }

    /// Pull the trigger. Held for `TRIGGER_HOLD_CYCLES` CPU cycles regardless
    /// of how long the host's input event actually lasted.
    pub fn pull_trigger(&mut self) {
        self.trigger_cycles_remaining = TRIGGER_HOLD_CYCLES;
    }

    /// Advance both countdowns by one CPU cycle.
    pub fn tick(&mut self) {
        self.trigger_cycles_remaining = self.trigger_cycles_remaining.saturating_sub(1);
        self.sensor_lit_cycles_remaining = self.sensor_lit_cycles_remaining.saturating_sub(1);
    }

    /// Observe a rendered pixel at `(x, y)`. If it falls within
    /// `SENSE_RADIUS` of the aim point and is bright enough to read as
    /// "light" on a CRT, arm the sensor for `SENSOR_LIT_CYCLES`.
    pub fn observe_pixel(&mut self, x: u16, y: u16, rgb: (u8, u8, u8)) {
        let Some((aim_x, aim_y)) = self.aim else {
            return;
        };
        if x.abs_diff(aim_x) > SENSE_RADIUS || y.abs_diff(aim_y) > SENSE_RADIUS {
            return;
        }
        if is_bright(rgb) {
            self.sensor_lit_cycles_remaining = SENSOR_LIT_CYCLES;
        }
    }

    /// The two bits the Zapper contributes to a `$4017` read: bit 3 clear
    /// while the sensor is lit, bit 4 clear while the trigger is held
    /// (active-low, matching the real peripheral).
    #[must_use]
    pub fn read_bits(&self) -> u8 {
        let light_bit = u8::from(self.sensor_lit_cycles_remaining == 0) << 3;
        let trigger_bit = u8::from(self.trigger_cycles_remaining == 0) << 4;
        light_bit | trigger_bit
    }
}

/// Approximate perceived brightness; the NES palette has no pure black
/// beyond this, so anything at or above it reads as "lit" to the photodiode.
fn is_bright(rgb: (u8, u8, u8)) -> bool {
    let (r, g, b) = rgb;
    u32::from(r) + u32::from(g) + u32::from(b) > 384
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_mutual_exclusion() {
        let mut state = ControllerState::default();
        state.set_button(Button::Left, true);
        assert!(state.button(Button::Left));
        state.set_button(Button::Right, true);
        assert!(state.button(Button::Right));
        assert!(!state.button(Button::Left));

        state.set_button(Button::Up, true);
        state.set_button(Button::Down, true);
        assert!(state.button(Button::Down));
        assert!(!state.button(Button::Up));
    }

    #[test]
    fn button_independent_axes_unaffected() {
        let mut state = ControllerState::default();
        state.set_button(Button::Up, true);
        state.set_button(Button::Left, true);
        assert!(state.button(Button::Up));
        assert!(state.button(Button::Left));
    }

    #[test]
    fn zapper_trigger_reads_held_for_window() {
        let mut zapper = Zapper::new();
        assert_eq!(zapper.read_bits() & 0x10, 0x10); // not pulled: bit set

        zapper.pull_trigger();
        assert_eq!(zapper.read_bits() & 0x10, 0); // pulled: bit clear

        for _ in 0..TRIGGER_HOLD_CYCLES {
            zapper.tick();
        }
        assert_eq!(zapper.read_bits() & 0x10, 0x10);
    }

    #[test]
    fn zapper_senses_bright_pixel_near_aim() {
        let mut zapper = Zapper::new();
        zapper.aim(Some((100, 50)));
        assert_eq!(zapper.read_bits() & 0x08, 0x08); // no light yet

        zapper.observe_pixel(100, 50, (255, 255, 255));
        assert_eq!(zapper.read_bits() & 0x08, 0); // lit

        for _ in 0..SENSOR_LIT_CYCLES {
            zapper.tick();
        }
        assert_eq!(zapper.read_bits() & 0x08, 0x08);
    }

    #[test]
    fn zapper_ignores_dim_or_distant_pixels() {
        let mut zapper = Zapper::new();
        zapper.aim(Some((100, 50)));

        zapper.observe_pixel(100, 50, (10, 10, 10));
        assert_eq!(zapper.read_bits() & 0x08, 0x08);

        zapper.observe_pixel(200, 50, (255, 255, 255));
        assert_eq!(zapper.read_bits() & 0x08, 0x08);
    }

    #[test]
    fn unaimed_zapper_never_senses_light() {
        let mut zapper = Zapper::new();
        zapper.observe_pixel(10, 10, (255, 255, 255));
        assert_eq!(zapper.read_bits() & 0x08, 0x08);
    }
}
