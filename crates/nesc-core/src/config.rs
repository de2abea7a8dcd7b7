//! Run configuration: TV timing standard, power-on RAM content, and the
//! Zapper peripheral.

use crate::input::ZapperConfig;

/// Television timing standard. Selects the PPU's scanline count and the
/// resulting frame rate/CPU clock relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TvSystem {
    /// 262 scanlines/frame, ~60.0988 Hz.
    #[default]
    Ntsc,
    /// 312 scanlines/frame, ~50.0070 Hz, no odd-frame dot skip.
    Pal,
}

impl TvSystem {
    /// PPU scanlines per frame for this TV system.
    #[must_use]
    pub fn scanlines_per_frame(self) -> u16 {
        match self {
            TvSystem::Ntsc => 262,
            TvSystem::Pal => 312,
        }
    }

    /// Target frame rate in Hz.
    #[must_use]
    pub fn frame_rate(self) -> f64 {
        match self {
            TvSystem::Ntsc => 60.0988,
            TvSystem::Pal => 50.0070,
        }
    }

    /// CPU clock frequency in Hz, derived from the shared master clock.
    #[must_use]
    pub fn cpu_clock_hz(self) -> u32 {
        match self {
            TvSystem::Ntsc => 21_477_272 / 12,
            TvSystem::Pal => 26_601_712 / 16,
        }
    }
}

/// Power-on content of the console's 2 KiB internal RAM.
///
/// Real hardware's RAM does not reliably power on to all zeroes; some test
/// ROMs assume a specific pattern. Default `Zero` matches deterministic
/// zero-initialized behavior so existing tests are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum RamFillPattern {
    /// All bytes zero.
    #[default]
    Zero,
    /// All bytes `0xFF`.
    AllOnes,
    /// Alternating `0x00`/`0xFF` every other byte.
    Checkerboard,
}

impl RamFillPattern {
    /// Fill a RAM buffer with this pattern.
    pub fn fill(self, ram: &mut [u8]) {
        match self {
            RamFillPattern::Zero => ram.fill(0),
            RamFillPattern::AllOnes => ram.fill(0xFF),
            RamFillPattern::Checkerboard => {
                for (i, byte) in ram.iter_mut().enumerate() {
                    *byte = if i % 2 == 0 { 0x00 } else { 0xFF };
                }
            }
        }
    }
}

/// Run configuration for a [`crate::Console`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// TV timing standard.
    pub tv_system: TvSystem,
    /// Power-on RAM fill pattern.
    pub ram_fill: RamFillPattern,
    /// Zapper light-gun connection.
    pub zapper: ZapperConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntsc_pal_scanline_counts() {
        assert_eq!(TvSystem::Ntsc.scanlines_per_frame(), 262);
        assert_eq!(TvSystem::Pal.scanlines_per_frame(), 312);
    }

    #[test]
    fn ram_fill_patterns() {
        let mut ram = [0x11u8; 8];
        RamFillPattern::AllOnes.fill(&mut ram);
        assert_eq!(ram, [0xFF; 8]);

        RamFillPattern::Checkerboard.fill(&mut ram);
        assert_eq!(ram, [0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF]);

        RamFillPattern::Zero.fill(&mut ram);
        assert_eq!(ram, [0; 8]);
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.tv_system, TvSystem::Ntsc);
        assert_eq!(config.ram_fill, RamFillPattern::Zero);
        assert!(!config.zapper.enabled);
    }
}
