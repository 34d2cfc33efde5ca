//! Named register accessors.
//!
//! Every peripheral register the HAL touches is reached through one of these traits, never through
//! raw addresses. Each accessor is a single register access with the read/modify/write behaviour
//! stated on the method: `_rd` reads, `_wr` overwrites, `_set`/`_clear` modify only the given bits,
//! and `_clr` methods are write-1-to-clear. Accesses take effect in program order; an
//! implementation backed by memory-mapped hardware must use volatile accesses.
//!
//! Registers marked *protected* ignore writes unless EALLOW is set (see [`sysctrl::protected`]).
//!
//! [`crate::sim::RegisterFile`] is the implementation shipped with this crate.

pub mod cputimer;
pub mod epwm;
pub mod gpio;
pub mod pie;
pub mod sysctrl;

pub use cputimer::CpuTimerRegs;
pub use epwm::EpwmRegs;
pub use gpio::GpioRegs;
pub use pie::PieRegs;
pub use sysctrl::SysCtrlRegs;

/// Every register accessor of the device
pub trait Registers: SysCtrlRegs + GpioRegs + PieRegs + EpwmRegs + CpuTimerRegs {}

impl<T: SysCtrlRegs + GpioRegs + PieRegs + EpwmRegs + CpuTimerRegs> Registers for T {}
