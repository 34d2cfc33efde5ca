//! Clock system configuration
//!
//! SYSCLKOUT is derived from the internal 10 MHz oscillator through the PLL:
//! `SYSCLKOUT = INTOSC1 * multiplier / divider`. With the PLL bypassed (multiplier 0) the
//! oscillator is only divided.

use crate::hw_traits::sysctrl::{protected, SysCtrlRegs};
use core::time::Duration;

/// INTOSC1 frequency
pub const INTOSC1: u32 = 10_000_000;

/// Highest PLL multiplier the device accepts
const PLL_MAX_MUL: u8 = 18;

/// SYSCLKOUT divider (PLLSTS.DIVSEL)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysclkDiv {
    /// Divide by 4. Mandatory while the PLL is being changed.
    _4 = 1,
    /// Divide by 2
    _2 = 2,
    /// No division
    _1 = 3,
}

impl SysclkDiv {
    /// Divisor selected by a DIVSEL value
    pub const fn divisor_of(divsel: u8) -> u32 {
        match divsel & 0b11 {
            0 | 1 => 4,
            2 => 2,
            _ => 1,
        }
    }
}

/// Builder object containing the PLL configuration. Defaults to the reset state: PLL bypassed and
/// SYSCLKOUT = INTOSC1 / 4.
pub struct ClockConfig<'r, S: SysCtrlRegs> {
    regs: &'r S,
    multiplier: u8,
    div: SysclkDiv,
}

impl<'r, S: SysCtrlRegs> ClockConfig<'r, S> {
    /// Start from the reset configuration
    pub fn new(regs: &'r S) -> Self {
        ClockConfig {
            regs,
            multiplier: 0,
            div: SysclkDiv::_4,
        }
    }

    /// Select the PLL multiplier and output divider. Frequency is
    /// `10 MHz * multiplier / div`. The multiplier is capped at 18; 0 bypasses the PLL.
    pub fn pll(mut self, multiplier: u8, div: SysclkDiv) -> Self {
        self.multiplier = multiplier.min(PLL_MAX_MUL);
        self.div = div;
        self
    }

    fn configure_periph(&self) {
        // PLL change procedure from the system control guide: the divider must sit at /4 while
        // PLLCR changes, and PLLCR may only be written once the PLL has locked.
        protected(self.regs, || {
            self.regs.divsel_wr(SysclkDiv::_4 as u8);
            if self.regs.pllcr_rd() != self.multiplier {
                while !self.regs.plllocks_rd() {}
                self.regs.pllcr_wr(self.multiplier);
                while !self.regs.plllocks_rd() {}
            }
            self.regs.divsel_wr(self.div as u8);
        });
    }

    /// Apply the clock configuration and return the SYSCLKOUT clock object
    pub fn freeze(self) -> Sysclk {
        self.configure_periph();
        let source = INTOSC1 * (self.multiplier.max(1) as u32);
        let sysclk = Sysclk(source / SysclkDiv::divisor_of(self.div as u8));
        log::debug!(
            "PLLCR = {}, DIVSEL = {:?}: SYSCLKOUT = {} Hz",
            self.multiplier,
            self.div,
            sysclk.0
        );
        sysclk
    }
}

/// Bring the device to its standard 90 MHz operating point (INTOSC1 x 18 / 2).
///
/// The caller must do this exactly once, before configuring any peripheral. Periods computed from
/// the returned [`Sysclk`] assume SYSCLKOUT never changes afterwards. A repeated call leaves PLLCR
/// alone but briefly drops SYSCLKOUT to /4 while it rewrites DIVSEL, which stretches whatever
/// period is running at the time.
pub fn platform_init<S: SysCtrlRegs>(regs: &S) -> Sysclk {
    ClockConfig::new(regs).pll(18, SysclkDiv::_2).freeze()
}

/// SYSCLKOUT clock object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sysclk(u32);

impl Sysclk {
    /// Number of SYSCLKOUT cycles in `duration`, rounded down
    pub fn cycles(&self, duration: Duration) -> u64 {
        let cycles = duration.as_nanos() * self.0 as u128 / 1_000_000_000;
        u64::try_from(cycles).unwrap_or(u64::MAX)
    }
}

/// Trait for configured clock objects
pub trait Clock {
    /// Type of the returned frequency value
    type Freq;

    /// Frequency of the clock
    fn freq(&self) -> Self::Freq;
}

impl Clock for Sysclk {
    type Freq = u32;

    fn freq(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RegisterFile;

    #[test]
    fn reset_config_is_intosc_over_4() {
        let regs = RegisterFile::new();
        let sysclk = ClockConfig::new(&regs).freeze();
        assert_eq!(sysclk.freq(), 2_500_000);
        assert_eq!(regs.divsel_rd(), SysclkDiv::_4 as u8);
        assert!(!regs.eallow_rd());
    }

    #[test]
    fn platform_init_runs_at_90_mhz() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        assert_eq!(sysclk.freq(), 90_000_000);
        assert_eq!(regs.pllcr_rd(), 18);
        assert_eq!(regs.divsel_rd(), SysclkDiv::_2 as u8);
        assert!(!regs.eallow_rd());
    }

    #[test]
    fn repeated_platform_init_keeps_pll() {
        let regs = RegisterFile::new();
        let first = platform_init(&regs);
        let second = platform_init(&regs);
        assert_eq!(first, second);
        assert_eq!(regs.pllcr_rd(), 18);
        assert_eq!(regs.divsel_rd(), SysclkDiv::_2 as u8);
    }

    #[test]
    fn multiplier_is_capped() {
        let regs = RegisterFile::new();
        let sysclk = ClockConfig::new(&regs).pll(40, SysclkDiv::_1).freeze();
        assert_eq!(sysclk.freq(), 180_000_000);
        assert_eq!(regs.pllcr_rd(), 18);
    }

    #[test]
    fn pll_writes_need_eallow() {
        let regs = RegisterFile::new();
        regs.pllcr_wr(9);
        assert_eq!(regs.pllcr_rd(), 0);
        protected(&regs, || regs.pllcr_wr(9));
        assert_eq!(regs.pllcr_rd(), 9);
    }

    #[test]
    fn cycles_from_duration() {
        let sysclk = Sysclk(90_000_000);
        assert_eq!(sysclk.cycles(Duration::from_secs(1)), 90_000_000);
        assert_eq!(sysclk.cycles(Duration::from_millis(10)), 900_000);
        assert_eq!(sysclk.cycles(Duration::from_secs(60)), 5_400_000_000);
    }
}
