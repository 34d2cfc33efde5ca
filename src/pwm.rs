//! ePWM time base and event trigger
//!
//! Only the parts of the ePWM modules that generate the periodic EPWMx_INT interrupt are covered:
//! the time-base counter and the event-trigger submodule. Every module's interrupt sits in PIE
//! group 3, channel = module number.
//!
//! The event-trigger flag (ETFLG.INT) is sticky. Until it is cleared with
//! [`Epwm::clear_interrupt`] the module raises no further interrupts, and the events it misses
//! are lost.

use crate::clock::{Clock, Sysclk};
use crate::error::ConfigError;
use crate::hw_traits::epwm::{tbctl_bits, EpwmRegs};
use crate::hw_traits::sysctrl::{protected, Pclkcr1, SysCtrlRegs};
use crate::isr::InterruptSource;
use crate::pie::Vector;

pub use crate::hw_traits::epwm::{ClkDiv, CtrMode, FreeSoft, HspClkDiv, IntSel};

/// ePWM module
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EpwmModule {
    Epwm1 = 0,
    Epwm2 = 1,
    Epwm3 = 2,
    Epwm4 = 3,
    Epwm5 = 4,
    Epwm6 = 5,
    Epwm7 = 6,
    Epwm8 = 7,
}

impl EpwmModule {
    /// Zero-based module index
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Interrupt vector of the module (PIE group 3)
    pub const fn vector(self) -> Vector {
        match self {
            EpwmModule::Epwm1 => Vector::EPWM1_INT,
            EpwmModule::Epwm2 => Vector::EPWM2_INT,
            EpwmModule::Epwm3 => Vector::EPWM3_INT,
            EpwmModule::Epwm4 => Vector::EPWM4_INT,
            EpwmModule::Epwm5 => Vector::EPWM5_INT,
            EpwmModule::Epwm6 => Vector::EPWM6_INT,
            EpwmModule::Epwm7 => Vector::EPWM7_INT,
            EpwmModule::Epwm8 => Vector::EPWM8_INT,
        }
    }

    /// Clock enable bit of the module
    pub const fn clock(self) -> Pclkcr1 {
        Pclkcr1::from_bits_truncate(1 << self as u16)
    }
}

/// Number of selected events per interrupt (ETPS.INTPRD)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPrescale {
    /// Interrupt on every event
    First = 1,
    /// Interrupt on every second event
    Second = 2,
    /// Interrupt on every third event
    Third = 3,
}

/// Configuration of an ePWM time base and interrupt. Defaults to the reset values of TBCTL
/// (up-count, TBCLK = SYSCLKOUT / 2, stop on emulation halt) with an interrupt on every
/// TBCTR = 0 event.
#[derive(Clone, Copy, Debug)]
pub struct EpwmConfig {
    mode: CtrMode,
    hsp_div: HspClkDiv,
    clk_div: ClkDiv,
    int_sel: IntSel,
    prescale: EventPrescale,
    free_soft: FreeSoft,
}

impl Default for EpwmConfig {
    fn default() -> Self {
        EpwmConfig {
            mode: CtrMode::Up,
            hsp_div: HspClkDiv::_2,
            clk_div: ClkDiv::_1,
            int_sel: IntSel::Zero,
            prescale: EventPrescale::First,
            free_soft: FreeSoft::StopAfterNext,
        }
    }
}

impl EpwmConfig {
    /// Select the counter mode
    pub const fn count_mode(mut self, mode: CtrMode) -> Self {
        self.mode = mode;
        self
    }

    /// Configure the time-base clock dividers. TBCLK = SYSCLKOUT / (hsp_div * clk_div).
    pub const fn clk_div(mut self, hsp_div: HspClkDiv, clk_div: ClkDiv) -> Self {
        self.hsp_div = hsp_div;
        self.clk_div = clk_div;
        self
    }

    /// Select the counter event that generates interrupts
    pub const fn interrupt_on(mut self, int_sel: IntSel) -> Self {
        self.int_sel = int_sel;
        self
    }

    /// Generate one interrupt per `prescale` events
    pub const fn event_prescale(mut self, prescale: EventPrescale) -> Self {
        self.prescale = prescale;
        self
    }

    /// Select the behaviour on emulation halt
    pub const fn emulation(mut self, free_soft: FreeSoft) -> Self {
        self.free_soft = free_soft;
        self
    }

    fn tbclk_div(&self) -> u32 {
        HspClkDiv::divisor_of(self.hsp_div as u16) * ClkDiv::divisor_of(self.clk_div as u16)
    }

    // TBPRD giving `hz` counter cycles per second
    fn period_for(&self, sysclk: &Sysclk, hz: u32) -> Result<u16, ConfigError> {
        if hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        let tbclk = sysclk.freq() / self.tbclk_div();
        let prd = match self.mode {
            CtrMode::UpDown => tbclk / hz / 2,
            _ => (tbclk / hz).saturating_sub(1),
        };
        match u16::try_from(prd) {
            Ok(0) | Err(_) => Err(ConfigError::PeriodOutOfRange),
            Ok(prd) => Ok(prd),
        }
    }
}

/// An ePWM module configured as a periodic interrupt source
pub struct Epwm<'r, R> {
    regs: &'r R,
    module: EpwmModule,
}

impl<'r, R: EpwmRegs + SysCtrlRegs> Epwm<'r, R> {
    /// Enable the module clock and configure the time base with period `tbprd`. The counter
    /// starts from 0 with the interrupt output disabled. A zero period is rejected.
    pub fn new(
        regs: &'r R,
        module: EpwmModule,
        config: EpwmConfig,
        tbprd: u16,
    ) -> Result<Self, ConfigError> {
        if tbprd == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        let n = module.index();
        protected(regs, || regs.pclkcr1_set(module.clock()));

        regs.inten_clear(n);
        regs.tbctl_wr(
            n,
            tbctl_bits(config.mode, config.hsp_div, config.clk_div, config.free_soft),
        );
        regs.tbprd_wr(n, tbprd);
        regs.tbctr_wr(n, 0);
        regs.intsel_wr(n, config.int_sel);
        regs.intprd_wr(n, config.prescale as u8);
        regs.etclr_int(n);
        log::debug!("ePWM{}: TBPRD = {}, {:?}", n + 1, tbprd, config.mode);

        Ok(Epwm { regs, module })
    }

    /// Configure the module so the counter completes `hz` cycles per second at `sysclk`
    pub fn with_frequency(
        regs: &'r R,
        module: EpwmModule,
        config: EpwmConfig,
        sysclk: &Sysclk,
        hz: u32,
    ) -> Result<Self, ConfigError> {
        let tbprd = config.period_for(sysclk, hz)?;
        Self::new(regs, module, config, tbprd)
    }
}

impl<'r, R: EpwmRegs> Epwm<'r, R> {
    /// Change the period. A zero period is rejected.
    pub fn set_period(&mut self, tbprd: u16) -> Result<(), ConfigError> {
        if tbprd == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        self.regs.tbprd_wr(self.module.index(), tbprd);
        Ok(())
    }

    /// TBPRD
    pub fn period(&self) -> u16 {
        self.regs.tbprd_rd(self.module.index())
    }

    /// Current TBCTR value
    pub fn counter(&self) -> u16 {
        self.regs.tbctr_rd(self.module.index())
    }

    /// The module
    pub fn module(&self) -> EpwmModule {
        self.module
    }

    /// Enable EPWMx_INT generation
    pub fn enable_interrupts(&mut self) {
        self.regs.inten_set(self.module.index());
    }

    /// Disable EPWMx_INT generation
    pub fn disable_interrupts(&mut self) {
        self.regs.inten_clear(self.module.index());
    }

    /// Whether ETFLG.INT is set
    pub fn is_interrupt_pending(&self) -> bool {
        self.regs.etflg_int_rd(self.module.index())
    }

    /// Clear ETFLG.INT, allowing the next interrupt
    #[inline]
    pub fn clear_interrupt(&self) {
        self.regs.etclr_int(self.module.index());
    }

    /// Raise an interrupt in software. Has no effect while interrupts are disabled.
    pub fn force_interrupt(&self) {
        self.regs.etfrc_int(self.module.index());
    }

    /// Events counted towards the next interrupt (ETPS.INTCNT)
    pub fn event_count(&self) -> u8 {
        self.regs.intcnt_rd(self.module.index())
    }
}

impl<'r, R: EpwmRegs> InterruptSource for Epwm<'r, R> {
    fn vector(&self) -> Vector {
        self.module.vector()
    }

    fn clear_interrupt(&mut self) {
        Epwm::clear_interrupt(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::platform_init;
    use crate::sim::RegisterFile;

    #[test]
    fn period_from_frequency() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let config = EpwmConfig::default();
        let pwm1 = Epwm::with_frequency(&regs, EpwmModule::Epwm1, config, &sysclk, 2000).unwrap();
        let pwm2 = Epwm::with_frequency(&regs, EpwmModule::Epwm2, config, &sysclk, 4000).unwrap();
        assert_eq!(pwm1.period(), 22499);
        assert_eq!(pwm2.period(), 11249);

        let updown = config.count_mode(CtrMode::UpDown);
        let pwm3 = Epwm::with_frequency(&regs, EpwmModule::Epwm3, updown, &sysclk, 2000).unwrap();
        assert_eq!(pwm3.period(), 11250);
    }

    #[test]
    fn bad_periods_rejected() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let config = EpwmConfig::default();
        assert!(matches!(
            Epwm::new(&regs, EpwmModule::Epwm1, config, 0),
            Err(ConfigError::ZeroPeriod)
        ));
        assert!(matches!(
            Epwm::with_frequency(&regs, EpwmModule::Epwm1, config, &sysclk, 0),
            Err(ConfigError::ZeroFrequency)
        ));
        // 45 MHz TBCLK cannot count 10 Hz in 16 bits
        assert!(matches!(
            Epwm::with_frequency(&regs, EpwmModule::Epwm1, config, &sysclk, 10),
            Err(ConfigError::PeriodOutOfRange)
        ));
        assert!(matches!(
            Epwm::with_frequency(&regs, EpwmModule::Epwm1, config, &sysclk, 45_000_000),
            Err(ConfigError::PeriodOutOfRange)
        ));
        assert_eq!(regs.pclkcr1_rd(), Pclkcr1::empty());
    }

    #[test]
    fn flag_is_sticky_until_cleared() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let mut pwm =
            Epwm::with_frequency(&regs, EpwmModule::Epwm1, EpwmConfig::default(), &sysclk, 2000)
                .unwrap();
        assert!(regs.pclkcr1_rd().contains(Pclkcr1::EPWM1ENCLK));
        pwm.enable_interrupts();

        // One counter cycle is 45000 SYSCLKOUT cycles
        regs.advance(45_000);
        assert!(pwm.is_interrupt_pending());
        regs.advance(3 * 45_000);
        let stats = regs.epwm_stats(EpwmModule::Epwm1);
        assert_eq!(stats.fired, 1);
        assert_eq!(stats.dropped, 3);

        pwm.clear_interrupt();
        assert!(!pwm.is_interrupt_pending());
        regs.advance(45_000);
        assert!(pwm.is_interrupt_pending());
        assert_eq!(regs.epwm_stats(EpwmModule::Epwm1).fired, 2);
    }

    #[test]
    fn counter_tracks_time() {
        let regs = RegisterFile::new();
        let pwm = Epwm::new(&regs, EpwmModule::Epwm4, EpwmConfig::default(), 99).unwrap();
        regs.advance(2 * 150);
        // TBCLK = SYSCLKOUT / 2, 100 counts per cycle
        assert_eq!(pwm.counter(), 50);

        let pwm = Epwm::new(
            &regs,
            EpwmModule::Epwm5,
            EpwmConfig::default().count_mode(CtrMode::UpDown),
            100,
        )
        .unwrap();
        regs.advance(2 * 150);
        assert_eq!(pwm.counter(), 50);
    }

    #[test]
    fn prescaled_events() {
        let regs = RegisterFile::new();
        let config = EpwmConfig::default()
            .clk_div(HspClkDiv::_1, ClkDiv::_1)
            .event_prescale(EventPrescale::Third);
        let mut pwm = Epwm::new(&regs, EpwmModule::Epwm2, config, 9).unwrap();
        pwm.enable_interrupts();

        regs.advance(20);
        assert_eq!(pwm.event_count(), 2);
        assert!(!pwm.is_interrupt_pending());
        regs.advance(10);
        assert!(pwm.is_interrupt_pending());
        assert_eq!(pwm.event_count(), 0);
    }

    #[test]
    fn zero_and_period_events() {
        let regs = RegisterFile::new();
        let config = EpwmConfig::default()
            .clk_div(HspClkDiv::_1, ClkDiv::_1)
            .interrupt_on(IntSel::ZeroOrPeriod);
        let mut pwm = Epwm::new(&regs, EpwmModule::Epwm3, config, 9).unwrap();
        pwm.enable_interrupts();

        // TBCTR = 9 after 9 cycles, TBCTR = 0 after 10
        regs.advance(9);
        assert!(pwm.is_interrupt_pending());
        pwm.clear_interrupt();
        regs.advance(1);
        assert!(pwm.is_interrupt_pending());
        assert_eq!(regs.epwm_stats(EpwmModule::Epwm3).fired, 2);
    }

    #[test]
    fn forced_interrupt() {
        let regs = RegisterFile::new();
        let mut pwm = Epwm::new(&regs, EpwmModule::Epwm6, EpwmConfig::default(), 100).unwrap();
        pwm.force_interrupt();
        assert!(!pwm.is_interrupt_pending());
        pwm.enable_interrupts();
        pwm.force_interrupt();
        assert!(pwm.is_interrupt_pending());
        InterruptSource::clear_interrupt(&mut pwm);
        assert!(!pwm.is_interrupt_pending());
    }
}
