//! Prelude

pub use crate::clock::Clock as _tms320f2806x_hal_Clock;
pub use crate::hw_traits::CpuTimerRegs as _tms320f2806x_hal_CpuTimerRegs;
pub use crate::hw_traits::EpwmRegs as _tms320f2806x_hal_EpwmRegs;
pub use crate::hw_traits::GpioRegs as _tms320f2806x_hal_GpioRegs;
pub use crate::hw_traits::PieRegs as _tms320f2806x_hal_PieRegs;
pub use crate::hw_traits::SysCtrlRegs as _tms320f2806x_hal_SysCtrlRegs;
pub use crate::isr::InterruptHandler as _tms320f2806x_hal_InterruptHandler;
pub use crate::isr::InterruptSource as _tms320f2806x_hal_InterruptSource;
pub use embedded_hal::digital::InputPin as _embedded_hal_InputPin;
pub use embedded_hal::digital::OutputPin as _embedded_hal_OutputPin;
pub use embedded_hal::digital::StatefulOutputPin as _embedded_hal_StatefulOutputPin;
