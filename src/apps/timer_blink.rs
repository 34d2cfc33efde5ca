//! CPU timer 0 (10 ms) toggles GPIO12, CPU timer 1 (1.5 s) toggles GPIO20 and CPU timer 2 (60 s)
//! toggles GPIO32.

use crate::clock::{platform_init, Sysclk};
use crate::error::{ConfigError, Error};
use crate::gpio::{Output, Parts, Pin};
use crate::hw_traits::Registers;
use crate::isr::ToggleIsr;
use crate::pie::{Pie, PieAck};
use crate::timer::{CpuTimer, CpuTimerId, Emulation};
use core::time::Duration;

/// Timer 0 period
pub const TIMER0_PERIOD: Duration = Duration::from_millis(10);
/// Timer 1 period
pub const TIMER1_PERIOD: Duration = Duration::from_millis(1500);
/// Timer 2 period
pub const TIMER2_PERIOD: Duration = Duration::from_secs(60);

/// Handler of one CPU timer
pub type TimerIsr<'r, R, const N: u8> = ToggleIsr<'r, R, Pin<'r, R, N, Output>, CpuTimer<'r, R>>;

/// Interrupt handlers of the application
pub struct Handlers<'r, R> {
    /// Timer 0, toggles GPIO12
    pub timer0: TimerIsr<'r, R, 12>,
    /// Timer 1, toggles GPIO20
    pub timer1: TimerIsr<'r, R, 20>,
    /// Timer 2, toggles GPIO32
    pub timer2: TimerIsr<'r, R, 32>,
}

fn periodic_timer<'r, R: Registers>(
    regs: &'r R,
    id: CpuTimerId,
    sysclk: &Sysclk,
    period: Duration,
) -> Result<CpuTimer<'r, R>, ConfigError> {
    let mut timer = CpuTimer::new(regs, id);
    timer.set_period(sysclk, period)?;
    timer.set_emulation(Emulation::FreeRun);
    timer.enable_interrupts();
    Ok(timer)
}

/// Bring the device to 90 MHz and configure the pins and timers. The timers are left stopped
/// until [`install`].
pub fn init<R: Registers>(regs: &R) -> Result<(Sysclk, Handlers<'_, R>), ConfigError> {
    let sysclk = platform_init(regs);
    let parts = Parts::new(regs);
    let ack = PieAck::new(regs);

    let handlers = Handlers {
        timer0: ToggleIsr::new(
            parts.gpio12.into_output(),
            periodic_timer(regs, CpuTimerId::Timer0, &sysclk, TIMER0_PERIOD)?,
            ack,
        ),
        timer1: ToggleIsr::new(
            parts.gpio20.into_output(),
            periodic_timer(regs, CpuTimerId::Timer1, &sysclk, TIMER1_PERIOD)?,
            ack,
        ),
        timer2: ToggleIsr::new(
            parts.gpio32.into_output(),
            periodic_timer(regs, CpuTimerId::Timer2, &sysclk, TIMER2_PERIOD)?,
            ack,
        ),
    };
    Ok((sysclk, handlers))
}

/// Bind and arm the three handlers, unmask interrupts, then start the timers
pub fn install<'r, 'h, R: Registers>(
    pie: &mut Pie<'r, 'h, R>,
    handlers: &'h mut Handlers<'r, R>,
) -> Result<(), Error> {
    let Handlers {
        timer0,
        timer1,
        timer2,
    } = handlers;
    let ids = [CpuTimerId::Timer0, CpuTimerId::Timer1, CpuTimerId::Timer2];
    pie.bind(ids[0].vector(), timer0)?;
    pie.bind(ids[1].vector(), timer1)?;
    pie.bind(ids[2].vector(), timer2)?;
    for id in ids {
        pie.arm(id.vector())?;
    }
    pie.enable_interrupts();

    // The handlers own the timers from here on
    for id in ids {
        CpuTimer::attach(pie.regs(), id).start();
    }
    Ok(())
}
