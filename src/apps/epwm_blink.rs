//! ePWM1 at 2 kHz toggles GPIO12, ePWM2 at 4 kHz toggles GPIO20. Both interrupt on TBCTR = 0
//! through PIE group 3.

use crate::clock::{platform_init, Sysclk};
use crate::error::{ConfigError, Error};
use crate::gpio::{Output, Parts, Pin};
use crate::hw_traits::Registers;
use crate::isr::ToggleIsr;
use crate::pie::{Pie, PieAck};
use crate::pwm::{Epwm, EpwmConfig, EpwmModule, FreeSoft, IntSel};

/// ePWM1 event rate
pub const EPWM1_HZ: u32 = 2000;
/// ePWM2 event rate
pub const EPWM2_HZ: u32 = 4000;

/// Handler of one ePWM module
pub type EpwmIsr<'r, R, const N: u8> = ToggleIsr<'r, R, Pin<'r, R, N, Output>, Epwm<'r, R>>;

/// Interrupt handlers of the application
pub struct Handlers<'r, R> {
    /// ePWM1, toggles GPIO12
    pub epwm1: EpwmIsr<'r, R, 12>,
    /// ePWM2, toggles GPIO20
    pub epwm2: EpwmIsr<'r, R, 20>,
}

/// Bring the device to 90 MHz and configure the pins and ePWM modules
pub fn init<R: Registers>(regs: &R) -> Result<(Sysclk, Handlers<'_, R>), ConfigError> {
    let sysclk = platform_init(regs);
    let parts = Parts::new(regs);
    let led1 = parts.gpio12.into_output();
    let led2 = parts.gpio20.into_output();

    let config = EpwmConfig::default()
        .interrupt_on(IntSel::Zero)
        .emulation(FreeSoft::Free);
    let epwm1 = Epwm::with_frequency(regs, EpwmModule::Epwm1, config, &sysclk, EPWM1_HZ)?;
    let epwm2 = Epwm::with_frequency(regs, EpwmModule::Epwm2, config, &sysclk, EPWM2_HZ)?;

    let ack = PieAck::new(regs);
    let handlers = Handlers {
        epwm1: ToggleIsr::new(led1, epwm1, ack),
        epwm2: ToggleIsr::new(led2, epwm2, ack),
    };
    Ok((sysclk, handlers))
}

/// Bind and arm both handlers, enable the ePWM interrupt outputs and unmask interrupts
pub fn install<'r, 'h, R: Registers>(
    pie: &mut Pie<'r, 'h, R>,
    handlers: &'h mut Handlers<'r, R>,
) -> Result<(), Error> {
    let Handlers { epwm1, epwm2 } = handlers;
    epwm1.source_mut().enable_interrupts();
    epwm2.source_mut().enable_interrupts();
    let (v1, v2) = (EpwmModule::Epwm1.vector(), EpwmModule::Epwm2.vector());
    pie.bind(v1, epwm1)?;
    pie.bind(v2, epwm2)?;
    pie.arm(v1)?;
    pie.arm(v2)?;
    pie.enable_interrupts();
    Ok(())
}
