//! CPU timers
//!
//! Three 32-bit down-counters clocked from SYSCLKOUT through a 16-bit prescaler. A timer
//! underflows every `(PRD + 1) * (TDDR + 1)` SYSCLKOUT cycles, reloads itself and sets TCR.TIF.
//! TIF stays set until it is cleared, and underflows that happen meanwhile do not raise another
//! interrupt.
//!
//! Timer 0 interrupts through PIE group 1 (INT1.7). Timers 1 and 2 drive INT13 and INT14
//! directly and need no PIE acknowledgment.

use crate::clock::Sysclk;
use crate::error::ConfigError;
use crate::hw_traits::cputimer::{CpuTimerRegs, Tcr};
use crate::hw_traits::sysctrl::{protected, Pclkcr3, SysCtrlRegs};
use crate::isr::InterruptSource;
use crate::pie::Vector;
use core::convert::Infallible;
use core::time::Duration;

const MAX_PRESCALE: u64 = 1 << 16;

/// CPU timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CpuTimerId {
    Timer0 = 0,
    Timer1 = 1,
    Timer2 = 2,
}

impl CpuTimerId {
    /// Zero-based timer index
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Interrupt vector of the timer
    pub const fn vector(self) -> Vector {
        match self {
            CpuTimerId::Timer0 => Vector::TINT0,
            CpuTimerId::Timer1 => Vector::TINT1,
            CpuTimerId::Timer2 => Vector::TINT2,
        }
    }

    /// Clock enable bit of the timer
    pub const fn clock(self) -> Pclkcr3 {
        match self {
            CpuTimerId::Timer0 => Pclkcr3::CPUTIMER0ENCLK,
            CpuTimerId::Timer1 => Pclkcr3::CPUTIMER1ENCLK,
            CpuTimerId::Timer2 => Pclkcr3::CPUTIMER2ENCLK,
        }
    }
}

/// Timer behaviour when the debugger halts the CPU (TCR.FREE/SOFT)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emulation {
    /// Stop after the next decrement
    StopAfterNext,
    /// Stop when the counter reaches 0
    StopAtZero,
    /// Keep running
    FreeRun,
}

impl Emulation {
    fn bits(self) -> Tcr {
        match self {
            Emulation::StopAfterNext => Tcr::empty(),
            Emulation::StopAtZero => Tcr::SOFT,
            Emulation::FreeRun => Tcr::FREE,
        }
    }
}

/// A CPU timer used as a periodic interrupt source
pub struct CpuTimer<'r, R> {
    regs: &'r R,
    id: CpuTimerId,
}

impl<'r, R: CpuTimerRegs + SysCtrlRegs> CpuTimer<'r, R> {
    /// Enable the timer clock and stop the timer, with its interrupt disabled and flag cleared
    pub fn new(regs: &'r R, id: CpuTimerId) -> Self {
        let n = id.index();
        protected(regs, || regs.pclkcr3_set(id.clock()));
        regs.tcr_set(n, Tcr::TSS);
        regs.tcr_clear(n, Tcr::TIE);
        regs.tif_clr(n);
        CpuTimer { regs, id }
    }
}

impl<'r, R: CpuTimerRegs> CpuTimer<'r, R> {
    /// Access a timer that is already configured, leaving its registers as they are
    pub fn attach(regs: &'r R, id: CpuTimerId) -> Self {
        CpuTimer { regs, id }
    }

    /// Load PRD and TDDR and reload the counter. The timer underflows every
    /// `(prd + 1) * (prescale + 1)` SYSCLKOUT cycles. A zero period is rejected.
    pub fn configure(&mut self, prd: u32, prescale: u16) -> Result<(), ConfigError> {
        if prd == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        let n = self.id.index();
        self.regs.prd_wr(n, prd);
        self.regs.tddr_wr(n, prescale);
        self.regs.tcr_set(n, Tcr::TRB);
        log::debug!("CPU timer {}: PRD = {}, TDDR = {}", n, prd, prescale);
        Ok(())
    }

    /// Configure the timer to underflow once per `period` at `sysclk`. The smallest prescaler
    /// that lets PRD fit in 32 bits is used, so the period is exact whenever the cycle count
    /// divides evenly by it.
    pub fn set_period(&mut self, sysclk: &Sysclk, period: Duration) -> Result<(), ConfigError> {
        let cycles = sysclk.cycles(period);
        if cycles == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        let prescale = cycles.div_ceil(1 << 32);
        if prescale > MAX_PRESCALE {
            return Err(ConfigError::PeriodOutOfRange);
        }
        let prd = u32::try_from(cycles / prescale - 1).map_err(|_| ConfigError::PeriodOutOfRange)?;
        if prd == 0 {
            return Err(ConfigError::PeriodOutOfRange);
        }
        self.configure(prd, (prescale - 1) as u16)
    }

    /// Select the behaviour on emulation halt
    pub fn set_emulation(&mut self, emulation: Emulation) {
        let n = self.id.index();
        self.regs.tcr_clear(n, Tcr::SOFT | Tcr::FREE);
        self.regs.tcr_set(n, emulation.bits());
    }

    /// Start counting
    pub fn start(&mut self) {
        self.regs.tcr_clear(self.id.index(), Tcr::TSS);
    }

    /// Stop counting. The counter keeps its value.
    pub fn stop(&mut self) {
        self.regs.tcr_set(self.id.index(), Tcr::TSS);
    }

    /// Reload the counter from PRD and the prescaler from TDDR
    pub fn reload(&mut self) {
        self.regs.tcr_set(self.id.index(), Tcr::TRB);
    }

    /// Enable the underflow interrupt
    pub fn enable_interrupts(&mut self) {
        self.regs.tcr_set(self.id.index(), Tcr::TIE);
    }

    /// Disable the underflow interrupt
    pub fn disable_interrupts(&mut self) {
        self.regs.tcr_clear(self.id.index(), Tcr::TIE);
    }

    /// Whether TIF is set
    pub fn is_interrupt_pending(&self) -> bool {
        self.regs.tcr_rd(self.id.index()).contains(Tcr::TIF)
    }

    /// Clear TIF
    #[inline]
    pub fn clear_interrupt(&self) {
        self.regs.tif_clr(self.id.index());
    }

    /// Poll for an underflow, clearing TIF when one has happened
    pub fn wait(&mut self) -> nb::Result<(), Infallible> {
        if self.is_interrupt_pending() {
            self.clear_interrupt();
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Current counter value (TIM)
    pub fn counter(&self) -> u32 {
        self.regs.tim_rd(self.id.index())
    }

    /// The timer
    pub fn id(&self) -> CpuTimerId {
        self.id
    }
}

impl<'r, R: CpuTimerRegs> InterruptSource for CpuTimer<'r, R> {
    fn vector(&self) -> Vector {
        self.id.vector()
    }

    fn clear_interrupt(&mut self) {
        CpuTimer::clear_interrupt(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::platform_init;
    use crate::sim::RegisterFile;

    #[test]
    fn periods_from_durations() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let mut t0 = CpuTimer::new(&regs, CpuTimerId::Timer0);
        let mut t1 = CpuTimer::new(&regs, CpuTimerId::Timer1);
        let mut t2 = CpuTimer::new(&regs, CpuTimerId::Timer2);
        t0.set_period(&sysclk, Duration::from_millis(10)).unwrap();
        t1.set_period(&sysclk, Duration::from_millis(1500)).unwrap();
        t2.set_period(&sysclk, Duration::from_secs(60)).unwrap();

        assert_eq!(regs.prd_rd(0), 899_999);
        assert_eq!(regs.tddr_rd(0), 0);
        assert_eq!(regs.prd_rd(1), 134_999_999);
        assert_eq!(regs.tddr_rd(1), 0);
        assert_eq!(regs.prd_rd(2), 2_699_999_999);
        assert_eq!(regs.tddr_rd(2), 1);
    }

    #[test]
    fn bad_periods_rejected() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        assert_eq!(timer.configure(0, 0), Err(ConfigError::ZeroPeriod));
        assert_eq!(
            timer.set_period(&sysclk, Duration::ZERO),
            Err(ConfigError::ZeroPeriod)
        );
        assert_eq!(
            timer.set_period(&sysclk, Duration::from_nanos(15)),
            Err(ConfigError::PeriodOutOfRange)
        );
        assert_eq!(
            timer.set_period(&sysclk, Duration::from_secs(1 << 22)),
            Err(ConfigError::PeriodOutOfRange)
        );
    }

    #[test]
    fn new_stops_and_clocks_timer() {
        let regs = RegisterFile::new();
        let timer = CpuTimer::new(&regs, CpuTimerId::Timer2);
        assert!(regs.tcr_rd(2).contains(Tcr::TSS));
        assert!(regs.pclkcr3_rd().contains(Pclkcr3::CPUTIMER2ENCLK));
        assert_eq!(timer.vector(), Vector::INT14);
    }

    #[test]
    fn wait_polls_underflow() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        timer.configure(99, 0).unwrap();
        timer.start();

        regs.advance(50);
        assert!(matches!(timer.wait(), Err(nb::Error::WouldBlock)));
        assert_eq!(timer.counter(), 49);
        regs.advance(50);
        assert!(timer.wait().is_ok());
        assert!(matches!(timer.wait(), Err(nb::Error::WouldBlock)));
        assert_eq!(timer.counter(), 99);
    }

    #[test]
    fn period_change_waits_for_underflow() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        timer.configure(999, 0).unwrap();
        timer.start();
        regs.advance(500);

        regs.prd_wr(0, 99);
        assert_eq!(regs.cycles_to_next_event(), Some(500));
        assert_eq!(timer.counter(), 499);
        regs.advance(499);
        assert!(matches!(timer.wait(), Err(nb::Error::WouldBlock)));
        regs.advance(1);
        assert!(timer.wait().is_ok());
        assert_eq!(timer.counter(), 99);

        regs.advance(100);
        assert!(timer.wait().is_ok());
        assert_eq!(regs.timer_stats(CpuTimerId::Timer0).fired, 2);
    }

    #[test]
    fn reload_applies_new_period() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        timer.configure(999, 0).unwrap();
        timer.start();
        regs.advance(500);
        regs.tddr_wr(0, 1);
        regs.prd_wr(0, 9);
        timer.reload();
        assert_eq!(timer.counter(), 9);
        assert_eq!(regs.cycles_to_next_event(), Some(20));
    }

    #[test]
    fn stopped_timer_holds() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer1);
        timer.configure(9, 1).unwrap();
        timer.start();
        regs.advance(6);
        assert_eq!(timer.counter(), 6);
        timer.stop();
        regs.advance(1000);
        assert_eq!(timer.counter(), 6);
        assert!(!timer.is_interrupt_pending());
        timer.reload();
        assert_eq!(timer.counter(), 9);
    }

    #[test]
    fn unacknowledged_underflows_are_dropped() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        timer.configure(9, 0).unwrap();
        timer.enable_interrupts();
        timer.start();
        regs.advance(50);
        let stats = regs.timer_stats(CpuTimerId::Timer0);
        assert_eq!(stats.fired, 1);
        assert_eq!(stats.dropped, 4);
    }
}
