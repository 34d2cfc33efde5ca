//! Simulated register file.
//!
//! [`RegisterFile`] stands in for the device's memory-mapped peripherals. It implements every
//! accessor trait in [`crate::hw_traits`] and reproduces the behaviour the interrupt protocol
//! depends on: counters that count, sticky flags that stay set, PIE groups that latch until
//! acknowledged and a core that only takes what IER and INTM let through.
//!
//! Time is measured in SYSCLKOUT cycles and only moves when [`RegisterFile::advance`] (or one of
//! the `run` helpers on [`Pie`]) is called. The simulation is event driven, so simulating a minute
//! of a 90 MHz device costs one step per interrupt rather than one per cycle.
//!
//! Register state after [`RegisterFile::new`] matches the device after reset, except that every
//! CPU timer is stopped (TSS = 1) and every peripheral clock is gated off.

mod cputimer;
mod epwm;
mod gpio;
mod pie;
mod sysctrl;

use crate::clock::{Clock, Sysclk};
use crate::hw_traits::cputimer::CPU_TIMERS;
use crate::hw_traits::epwm::EPWM_MODULES;
use crate::pie::Pie;
use crate::pwm::EpwmModule;
use crate::timer::CpuTimerId;
use core::cell::Cell;
use core::time::Duration;

use cputimer::TimerBlock;
use epwm::EpwmBlock;
use gpio::GpioBlock;
use pie::PieBlock;
use sysctrl::SysCtrlBlock;

/// Event counters kept by the simulator for one interrupt source. These are not device registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Events that set the source flag
    pub fired: u32,
    /// Events lost because the source flag was still set
    pub dropped: u32,
}

#[derive(Default)]
struct StatCells {
    fired: Cell<u32>,
    dropped: Cell<u32>,
}

impl StatCells {
    fn fire(&self) {
        self.fired.set(self.fired.get().wrapping_add(1));
    }

    fn drop_events(&self, count: u64) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.dropped.set(self.dropped.get().saturating_add(count));
    }

    fn snapshot(&self) -> SourceStats {
        SourceStats {
            fired: self.fired.get(),
            dropped: self.dropped.get(),
        }
    }
}

/// Interrupt line a peripheral drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Line {
    /// PIE group (zero-based) and channel (zero-based)
    Pie { group: u8, channel: u8 },
    /// Core line wired directly to IFR, by bit position
    Core(u8),
}

/// The whole device as seen through its registers
pub struct RegisterFile {
    now: Cell<u64>,
    eallow: Cell<bool>,
    sysctrl: SysCtrlBlock,
    gpio: GpioBlock,
    pie: PieBlock,
    epwm: [EpwmBlock; EPWM_MODULES as usize],
    timers: [TimerBlock; CPU_TIMERS as usize],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Register file in its reset state
    pub fn new() -> Self {
        RegisterFile {
            now: Cell::new(0),
            eallow: Cell::new(false),
            sysctrl: SysCtrlBlock::new(),
            gpio: GpioBlock::new(),
            pie: PieBlock::new(),
            epwm: core::array::from_fn(|_| EpwmBlock::new()),
            timers: core::array::from_fn(|_| TimerBlock::new()),
        }
    }

    /// SYSCLKOUT cycles elapsed since reset
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Number of times the level of GPIO `pin` changed while it was an output
    pub fn gpio_toggles(&self, pin: u8) -> u32 {
        self.gpio.toggles(pin)
    }

    /// Drive the external level seen by GPIO `pin` while it is an input
    pub fn drive_input(&self, pin: u8, high: bool) {
        self.gpio.drive_input(pin, high);
    }

    /// Event counters of an ePWM module
    pub fn epwm_stats(&self, module: EpwmModule) -> SourceStats {
        self.epwm[module.index() as usize].stats.snapshot()
    }

    /// Event counters of a CPU timer
    pub fn timer_stats(&self, id: CpuTimerId) -> SourceStats {
        self.timers[id.index() as usize].stats.snapshot()
    }

    /// Cycles until the next source event that can change interrupt state, if any source is
    /// running. Never returns `Some(0)`.
    pub fn cycles_to_next_event(&self) -> Option<u64> {
        let epwm = (0..EPWM_MODULES).filter_map(|n| self.epwm_cycles_to_event(n));
        let timers = (0..CPU_TIMERS).filter_map(|n| self.timer_cycles_to_event(n));
        epwm.chain(timers).min()
    }

    /// Let `cycles` SYSCLKOUT cycles pass: move every running counter, raise source flags and
    /// route them through the PIE to the core. Handlers are not run; see [`Pie::service`].
    pub fn advance(&self, cycles: u64) {
        if cycles > 0 {
            for n in 0..EPWM_MODULES {
                self.epwm_advance(n, cycles);
            }
            for n in 0..CPU_TIMERS {
                self.timer_advance(n, cycles);
            }
            self.now.set(self.now.get().saturating_add(cycles));
        }
        self.propagate();
    }

    fn raise(&self, line: Line) {
        match line {
            Line::Pie { group, channel } => self.pie_raise(group, channel),
            Line::Core(bit) => self.core_raise(bit),
        }
    }

    // Protected registers drop writes outside EALLOW, as the device does
    fn allowed(&self, register: &str) -> bool {
        let allowed = self.eallow.get();
        if !allowed {
            log::warn!("write to {} ignored: EALLOW not set", register);
        }
        allowed
    }
}

impl<'r, 'h> Pie<'r, 'h, RegisterFile> {
    /// Run the device for `cycles` SYSCLKOUT cycles, servicing interrupts as they become
    /// deliverable. Events falling exactly on the last cycle are delivered before returning.
    /// Returns the number of handlers run.
    pub fn run(&mut self, cycles: u64) -> usize {
        let regs = self.regs();
        let mut delivered = self.service_all();
        let mut remaining = cycles;
        while remaining > 0 {
            let step = regs
                .cycles_to_next_event()
                .map_or(remaining, |next| next.min(remaining));
            regs.advance(step);
            remaining -= step;
            delivered += self.service_all();
        }
        delivered
    }

    /// Run the device for `duration` of simulated time at the given SYSCLKOUT
    pub fn run_for(&mut self, sysclk: &Sysclk, duration: Duration) -> usize {
        log::debug!(
            "running {:?} at {} Hz ({} cycles)",
            duration,
            sysclk.freq(),
            sysclk.cycles(duration)
        );
        self.run(sysclk.cycles(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::platform_init;
    use crate::pwm::{Epwm, EpwmConfig};
    use crate::timer::CpuTimer;

    #[test]
    fn time_saturates() {
        let regs = RegisterFile::new();
        let mut timer = CpuTimer::new(&regs, CpuTimerId::Timer0);
        timer.configure(99, 0).unwrap();
        timer.start();
        let mut pwm = Epwm::new(&regs, EpwmModule::Epwm1, EpwmConfig::default(), 99).unwrap();
        pwm.enable_interrupts();

        regs.advance(u64::MAX);
        regs.advance(1);
        assert_eq!(regs.now(), u64::MAX);
        assert!(timer.is_interrupt_pending());
        assert!(pwm.is_interrupt_pending());
        assert_eq!(regs.timer_stats(CpuTimerId::Timer0).fired, 1);
        assert_eq!(regs.epwm_stats(EpwmModule::Epwm1).fired, 1);
    }

    #[test]
    fn idle_run_for_longest_duration() {
        let regs = RegisterFile::new();
        let sysclk = platform_init(&regs);
        let mut pie = Pie::new(&regs);
        assert_eq!(pie.run_for(&sysclk, Duration::MAX), 0);
        assert_eq!(regs.now(), u64::MAX);
    }
}
