use super::{Line, RegisterFile, StatCells};
use crate::hw_traits::cputimer::{CpuTimerRegs, Tcr};
use core::cell::Cell;

// TINT0 goes through PIE group 1 (INT1.7). TINT1 and TINT2 drive INT13 and INT14 directly.
const TIMER_LINES: [Line; 3] = [
    Line::Pie {
        group: 0,
        channel: 6,
    },
    Line::Core(12),
    Line::Core(13),
];

pub(super) struct TimerBlock {
    prd: Cell<u32>,
    tddr: Cell<u16>,
    // Period and prescaler the counter is running with. PRD and TDDR are copied here on TRB and
    // on underflow.
    loaded_prd: Cell<u32>,
    loaded_tddr: Cell<u16>,
    // SYSCLKOUT cycles since the last reload, always below `cycle_len()`
    pos: Cell<u64>,
    tcr: Cell<Tcr>,
    pub(super) stats: StatCells,
}

impl TimerBlock {
    pub(super) fn new() -> Self {
        TimerBlock {
            prd: Cell::new(u32::MAX),
            tddr: Cell::new(0),
            loaded_prd: Cell::new(u32::MAX),
            loaded_tddr: Cell::new(0),
            pos: Cell::new(0),
            tcr: Cell::new(Tcr::TSS),
            stats: StatCells::default(),
        }
    }

    fn reload(&self) {
        self.loaded_prd.set(self.prd.get());
        self.loaded_tddr.set(self.tddr.get());
        self.pos.set(0);
    }

    fn prescale(&self) -> u64 {
        self.loaded_tddr.get() as u64 + 1
    }

    // SYSCLKOUT cycles between underflows
    fn cycle_len(&self) -> u64 {
        (self.loaded_prd.get() as u64 + 1) * self.prescale()
    }
}

impl RegisterFile {
    fn timer_running(&self, n: u8) -> bool {
        let block = &self.timers[n as usize];
        self.timer_clock_enabled(n)
            && !block.tcr.get().contains(Tcr::TSS)
            && block.loaded_prd.get() != 0
    }

    pub(super) fn timer_cycles_to_event(&self, n: u8) -> Option<u64> {
        let block = &self.timers[n as usize];
        if !self.timer_running(n) || block.tcr.get().contains(Tcr::TIF) {
            return None;
        }
        Some(block.cycle_len() - block.pos.get())
    }

    pub(super) fn timer_advance(&self, n: u8, cycles: u64) {
        if !self.timer_running(n) {
            return;
        }
        let block = &self.timers[n as usize];
        let total = block.pos.get().saturating_add(cycles);
        let len = block.cycle_len();
        if total < len {
            block.pos.set(total);
            return;
        }

        // The first underflow ends the running period. Later ones use the reloaded period.
        block.reload();
        let rest = total - len;
        let mut underflows = 1;
        if block.loaded_prd.get() != 0 {
            let len = block.cycle_len();
            underflows += rest / len;
            block.pos.set(rest % len);
        }

        let tcr = block.tcr.get();
        if !tcr.contains(Tcr::TIF) {
            underflows -= 1;
            block.tcr.set(tcr | Tcr::TIF);
            block.stats.fire();
            if tcr.contains(Tcr::TIE) {
                self.raise(TIMER_LINES[n as usize]);
            }
        }
        if underflows > 0 {
            log::trace!("CPU timer {}: {} underflow(s) dropped, TIF set", n, underflows);
            block.stats.drop_events(underflows);
        }
    }
}

impl CpuTimerRegs for RegisterFile {
    fn prd_wr(&self, n: u8, period: u32) {
        self.timers[n as usize].prd.set(period);
    }

    fn prd_rd(&self, n: u8) -> u32 {
        self.timers[n as usize].prd.get()
    }

    fn tim_rd(&self, n: u8) -> u32 {
        let block = &self.timers[n as usize];
        let elapsed = block.pos.get() / block.prescale();
        block.loaded_prd.get().saturating_sub(elapsed as u32)
    }

    fn tddr_wr(&self, n: u8, prescale: u16) {
        self.timers[n as usize].tddr.set(prescale);
    }

    fn tddr_rd(&self, n: u8) -> u16 {
        self.timers[n as usize].tddr.get()
    }

    fn tcr_rd(&self, n: u8) -> Tcr {
        self.timers[n as usize].tcr.get()
    }

    fn tcr_set(&self, n: u8, bits: Tcr) {
        let block = &self.timers[n as usize];
        if bits.contains(Tcr::TRB) {
            block.reload();
        }
        let bits = bits - Tcr::TRB - Tcr::TIF;
        block.tcr.set(block.tcr.get() | bits);
    }

    fn tcr_clear(&self, n: u8, bits: Tcr) {
        let tcr = &self.timers[n as usize].tcr;
        tcr.set(tcr.get() - (bits - Tcr::TIF));
    }

    fn tif_clr(&self, n: u8) {
        let tcr = &self.timers[n as usize].tcr;
        tcr.set(tcr.get() - Tcr::TIF);
    }
}
