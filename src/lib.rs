//! Interrupt-driven ePWM and CPU timer support for the TMS320F2806x family of C2000 digital signal
//! controllers. Here is the [`Technical Reference Manual`] for reference.
//!
//! The crate is built around the device's interrupt acknowledgment protocol. A peripheral event
//! only reaches its handler if the peripheral flag, the PIE group latch and the core enable mask
//! all let it through, and the handler must release both latches before the next event can be
//! delivered. See the [`pie`] module for the details.
//!
//! Peripherals are reached through the register accessor traits of [`hw_traits`], never through
//! global state. [`sim::RegisterFile`] implements them in software, reproducing counters, sticky
//! flags and the PIE, so that everything here runs and is tested on a host.
//!
//! # Usage
//!
//! Bring up the clock with [`clock::platform_init`], configure pins and interrupt sources, then
//! bind handlers on a [`pie::Pie`] and arm them. The [`apps`] module contains two complete
//! applications.
//!
//! [`Technical Reference Manual`]: https://www.ti.com/lit/ug/spruh18i/spruh18i.pdf

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod apps;
pub mod clock;
pub mod error;
pub mod gpio;
pub mod hw_traits;
pub mod isr;
pub mod pie;
pub mod prelude;
pub mod pwm;
pub mod sim;
pub mod timer;

mod util;

pub use error::Error;
