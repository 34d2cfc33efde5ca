//! Firmware applications
//!
//! Each application is split in two steps, mirroring the firmware start-up sequence:
//! `init` brings up the clock, GPIO and interrupt sources and returns the handlers, and
//! `install` binds and arms them on an initialised [`Pie`](crate::pie::Pie) before enabling
//! interrupts globally.
//!
//! ```
//! use core::time::Duration;
//! use tms320f2806x_hal::apps::epwm_blink;
//! use tms320f2806x_hal::pie::Pie;
//! use tms320f2806x_hal::sim::RegisterFile;
//!
//! let regs = RegisterFile::new();
//! let (sysclk, mut handlers) = epwm_blink::init(&regs).unwrap();
//! let mut pie = Pie::new(&regs);
//! epwm_blink::install(&mut pie, &mut handlers).unwrap();
//! pie.run_for(&sysclk, Duration::from_millis(10));
//! assert_eq!(regs.gpio_toggles(12), 20);
//! ```

pub mod epwm_blink;
pub mod timer_blink;
