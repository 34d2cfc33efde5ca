//! End-to-end run of the CPU timer blink application

use core::time::Duration;
use tms320f2806x_hal::apps::timer_blink;
use tms320f2806x_hal::hw_traits::cputimer::Tcr;
use tms320f2806x_hal::pie::Pie;
use tms320f2806x_hal::prelude::*;
use tms320f2806x_hal::sim::RegisterFile;
use tms320f2806x_hal::timer::CpuTimerId;

#[test]
fn configures_periods() {
    let regs = RegisterFile::new();
    let (_, handlers) = timer_blink::init(&regs).unwrap();
    assert_eq!(regs.prd_rd(0), 899_999);
    assert_eq!(regs.prd_rd(1), 134_999_999);
    assert_eq!(regs.prd_rd(2), 2_699_999_999);
    assert_eq!(regs.tddr_rd(2), 1);
    // Timers only start on install
    assert!(!handlers.timer0.source().is_interrupt_pending());
    regs.advance(10_000_000);
    assert_eq!(regs.timer_stats(CpuTimerId::Timer0).fired, 0);
}

#[test]
fn timers_free_run_under_debug_halt() {
    let regs = RegisterFile::new();
    let _ = timer_blink::init(&regs).unwrap();
    for n in 0..3 {
        let tcr = regs.tcr_rd(n);
        assert!(tcr.contains(Tcr::FREE));
        assert!(!tcr.contains(Tcr::SOFT));
    }
}

#[test]
fn install_starts_timers_after_arming() {
    let regs = RegisterFile::new();
    let (_, mut handlers) = timer_blink::init(&regs).unwrap();
    let mut pie = Pie::new(&regs);
    for n in 0..3 {
        assert!(regs.tcr_rd(n).contains(Tcr::TSS));
    }

    timer_blink::install(&mut pie, &mut handlers).unwrap();
    assert!(!regs.intm_rd());
    for id in [CpuTimerId::Timer0, CpuTimerId::Timer1, CpuTimerId::Timer2] {
        assert!(pie.is_armed(id.vector()));
        assert!(!regs.tcr_rd(id.index()).contains(Tcr::TSS));
    }
}

#[test]
fn one_minute_of_blinking() {
    let regs = RegisterFile::new();
    let (sysclk, mut handlers) = timer_blink::init(&regs).unwrap();
    let mut pie = Pie::new(&regs);
    timer_blink::install(&mut pie, &mut handlers).unwrap();

    let delivered = pie.run_for(&sysclk, Duration::from_secs(60));
    assert_eq!(delivered, 6041);
    assert_eq!(regs.gpio_toggles(12), 6000);
    assert_eq!(regs.gpio_toggles(20), 40);
    assert_eq!(regs.gpio_toggles(32), 1);
    for id in [CpuTimerId::Timer0, CpuTimerId::Timer1, CpuTimerId::Timer2] {
        assert_eq!(regs.timer_stats(id).dropped, 0);
    }
}

#[test]
fn pins_toggle_independently() {
    let regs = RegisterFile::new();
    let (sysclk, mut handlers) = timer_blink::init(&regs).unwrap();
    let mut pie = Pie::new(&regs);
    timer_blink::install(&mut pie, &mut handlers).unwrap();

    pie.run_for(&sysclk, Duration::from_millis(1500));
    assert_eq!(regs.gpio_toggles(12), 150);
    assert_eq!(regs.gpio_toggles(20), 1);
    assert_eq!(regs.gpio_toggles(32), 0);

    pie.run_for(&sysclk, Duration::from_millis(1499));
    assert_eq!(regs.gpio_toggles(12), 299);
    assert_eq!(regs.gpio_toggles(20), 1);
}
