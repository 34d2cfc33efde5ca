//! GPIO
//!
//! Each of GPIO0-58 is a typed [`Pin`] whose mode is tracked in its type. Pins start out as
//! inputs with the GPIO function selected, which is the reset state of the device. Output pins
//! use the SET/CLEAR/TOGGLE registers, so writing one pin never disturbs the others on its port.

use crate::hw_traits::gpio::{GpioRegs, Port};
use crate::hw_traits::sysctrl::{protected, Pclkcr3, SysCtrlRegs};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

/// Input pin typestate
pub struct Input;
/// Output pin typestate
pub struct Output;

/// Marker trait for pin modes
pub trait PinMode: private::Sealed {}
impl PinMode for Input {}
impl PinMode for Output {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Input {}
    impl Sealed for super::Output {}
}

/// GPIO pin `N` in mode `MODE`
pub struct Pin<'r, R, const N: u8, MODE> {
    regs: &'r R,
    _mode: PhantomData<MODE>,
}

impl<'r, R, const N: u8, MODE> Pin<'r, R, N, MODE> {
    const PORT: Port = Port::of(N).0;
    const BIT: u8 = Port::of(N).1;
    const MASK: u32 = 1 << Self::BIT;

    /// GPIO number of this pin
    pub const fn number(&self) -> u8 {
        N
    }
}

impl<'r, R: GpioRegs + SysCtrlRegs, const N: u8, MODE: PinMode> Pin<'r, R, N, MODE> {
    /// Select the GPIO function and configure the pin as an output. The output latch keeps its
    /// previous value.
    pub fn into_output(self) -> Pin<'r, R, N, Output> {
        protected(self.regs, || {
            self.regs.gpxmux_wr(Self::PORT, Self::BIT, 0);
            self.regs.gpxdir_set(Self::PORT, Self::MASK);
        });
        Pin {
            regs: self.regs,
            _mode: PhantomData,
        }
    }

    /// Select the GPIO function and configure the pin as an input
    pub fn into_input(self) -> Pin<'r, R, N, Input> {
        protected(self.regs, || {
            self.regs.gpxmux_wr(Self::PORT, Self::BIT, 0);
            self.regs.gpxdir_clear(Self::PORT, Self::MASK);
        });
        Pin {
            regs: self.regs,
            _mode: PhantomData,
        }
    }
}

impl<'r, R, const N: u8, MODE> ErrorType for Pin<'r, R, N, MODE> {
    type Error = Infallible;
}

impl<'r, R: GpioRegs, const N: u8> InputPin for Pin<'r, R, N, Input> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.gpxdat_rd(Self::PORT) & Self::MASK != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.gpxdat_rd(Self::PORT) & Self::MASK == 0)
    }
}

impl<'r, R: GpioRegs, const N: u8> OutputPin for Pin<'r, R, N, Output> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.regs.gpxclear_wr(Self::PORT, Self::MASK);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.regs.gpxset_wr(Self::PORT, Self::MASK);
        Ok(())
    }
}

impl<'r, R: GpioRegs, const N: u8> StatefulOutputPin for Pin<'r, R, N, Output> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.gpxdat_rd(Self::PORT) & Self::MASK != 0)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.gpxdat_rd(Self::PORT) & Self::MASK == 0)
    }

    // Single write to GPxTOGGLE instead of a read-modify-write
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.regs.gpxtoggle_wr(Self::PORT, Self::MASK);
        Ok(())
    }
}

macro_rules! gpio_parts {
    ($($name:ident: $n:literal),* $(,)?) => {
        /// Every GPIO pin of the device, in its reset state
        pub struct Parts<'r, R> {
            $(
                #[allow(missing_docs)]
                pub $name: Pin<'r, R, $n, Input>,
            )*
        }

        impl<'r, R: GpioRegs + SysCtrlRegs> Parts<'r, R> {
            /// Split the GPIO block into pins. Enables the GPIO input clock.
            pub fn new(regs: &'r R) -> Self {
                protected(regs, || regs.pclkcr3_set(Pclkcr3::GPIOINENCLK));
                Parts {
                    $(
                        $name: Pin { regs, _mode: PhantomData },
                    )*
                }
            }
        }
    };
}

gpio_parts!(
    gpio0: 0, gpio1: 1, gpio2: 2, gpio3: 3, gpio4: 4, gpio5: 5, gpio6: 6, gpio7: 7,
    gpio8: 8, gpio9: 9, gpio10: 10, gpio11: 11, gpio12: 12, gpio13: 13, gpio14: 14, gpio15: 15,
    gpio16: 16, gpio17: 17, gpio18: 18, gpio19: 19, gpio20: 20, gpio21: 21, gpio22: 22,
    gpio23: 23, gpio24: 24, gpio25: 25, gpio26: 26, gpio27: 27, gpio28: 28, gpio29: 29,
    gpio30: 30, gpio31: 31, gpio32: 32, gpio33: 33, gpio34: 34, gpio35: 35, gpio36: 36,
    gpio37: 37, gpio38: 38, gpio39: 39, gpio40: 40, gpio41: 41, gpio42: 42, gpio43: 43,
    gpio44: 44, gpio45: 45, gpio46: 46, gpio47: 47, gpio48: 48, gpio49: 49, gpio50: 50,
    gpio51: 51, gpio52: 52, gpio53: 53, gpio54: 54, gpio55: 55, gpio56: 56, gpio57: 57,
    gpio58: 58,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RegisterFile;

    #[test]
    fn output_toggles_one_pin() {
        let regs = RegisterFile::new();
        let parts = Parts::new(&regs);
        let mut led = parts.gpio12.into_output();
        let mut other = parts.gpio13.into_output();
        other.set_high().unwrap();

        assert!(led.is_set_low().unwrap());
        led.toggle().unwrap();
        assert!(led.is_set_high().unwrap());
        led.toggle().unwrap();
        assert!(led.is_set_low().unwrap());

        assert_eq!(regs.gpio_toggles(12), 2);
        assert_eq!(regs.gpio_toggles(13), 1);
        assert!(other.is_set_high().unwrap());
    }

    #[test]
    fn port_b_pin() {
        let regs = RegisterFile::new();
        let parts = Parts::new(&regs);
        let mut pin = parts.gpio32.into_output();
        pin.set_high().unwrap();
        assert_eq!(regs.gpxdat_rd(Port::B), 1);
        assert_eq!(pin.number(), 32);
        assert_eq!(regs.gpio_toggles(32), 1);
    }

    #[test]
    fn input_reads_driven_level() {
        let regs = RegisterFile::new();
        let parts = Parts::new(&regs);
        let mut pin = parts.gpio58.into_input();
        assert!(pin.is_low().unwrap());
        regs.drive_input(58, true);
        assert!(pin.is_high().unwrap());
    }

    #[test]
    fn direction_needs_eallow() {
        let regs = RegisterFile::new();
        regs.gpxdir_set(Port::A, 1 << 5);
        assert_eq!(regs.gpxdir_rd(Port::A), 0);

        let parts = Parts::new(&regs);
        let _pin = parts.gpio5.into_output();
        assert_eq!(regs.gpxdir_rd(Port::A), 1 << 5);
        assert!(!regs.eallow_rd());
    }
}
