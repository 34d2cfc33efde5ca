use super::{Line, RegisterFile, StatCells};
use crate::hw_traits::epwm::{
    ClkDiv, CtrMode, EpwmRegs, HspClkDiv, IntSel, TBCTL_CLKDIV_SHIFT, TBCTL_CTRMODE_SHIFT,
    TBCTL_HSPCLKDIV_SHIFT,
};
use core::cell::Cell;

// ePWM interrupts all land in PIE group 3, channel = module
const EPWM_PIE_GROUP: u8 = 2;

const ETSEL_INTSEL_MASK: u16 = 0b111;
const ETSEL_INTEN: u16 = 1 << 3;
const ETPS_INTPRD_MASK: u16 = 0b11;
const ETPS_INTCNT_SHIFT: u16 = 2;

// TBCTL after reset: up-count, HSPCLKDIV = /2, CLKDIV = /1, stop after next
const TBCTL_RESET: u16 = (HspClkDiv::_2 as u16) << TBCTL_HSPCLKDIV_SHIFT;

pub(super) struct EpwmBlock {
    tbctl: Cell<u16>,
    tbprd: Cell<u16>,
    // Position inside one counter cycle, in TBCLK ticks. TBCTR is derived from it.
    pos: Cell<u32>,
    // SYSCLKOUT cycles already counted towards the next TBCLK tick
    phase: Cell<u64>,
    etsel: Cell<u16>,
    etps: Cell<u16>,
    etflg: Cell<bool>,
    pub(super) stats: StatCells,
}

impl EpwmBlock {
    pub(super) fn new() -> Self {
        EpwmBlock {
            tbctl: Cell::new(TBCTL_RESET),
            tbprd: Cell::new(0),
            pos: Cell::new(0),
            phase: Cell::new(0),
            etsel: Cell::new(0),
            etps: Cell::new(0),
            etflg: Cell::new(false),
            stats: StatCells::default(),
        }
    }

    fn mode(&self) -> CtrMode {
        CtrMode::from_bits(self.tbctl.get() >> TBCTL_CTRMODE_SHIFT)
    }

    fn divisor(&self) -> u64 {
        let tbctl = self.tbctl.get();
        let hsp = HspClkDiv::divisor_of(tbctl >> TBCTL_HSPCLKDIV_SHIFT);
        let clk = ClkDiv::divisor_of(tbctl >> TBCTL_CLKDIV_SHIFT);
        (hsp * clk) as u64
    }

    // TBCLK ticks in one full counter cycle. A zero period is left undefined by the device, so
    // the model keeps such a counter still.
    fn cycle_len(&self) -> Option<u32> {
        let prd = self.tbprd.get() as u32;
        if prd == 0 {
            return None;
        }
        match self.mode() {
            CtrMode::Up | CtrMode::Down => Some(prd + 1),
            CtrMode::UpDown => Some(2 * prd),
            CtrMode::Freeze => None,
        }
    }

    fn counter(&self) -> u16 {
        let prd = self.tbprd.get() as u32;
        let pos = self.pos.get();
        let count = match self.mode() {
            CtrMode::Up | CtrMode::Freeze => pos,
            CtrMode::Down => prd.saturating_sub(pos),
            CtrMode::UpDown if pos <= prd => pos,
            CtrMode::UpDown => 2 * prd - pos,
        };
        count as u16
    }

    fn set_counter(&self, count: u16) {
        let prd = self.tbprd.get();
        let count = count.min(prd) as u32;
        let pos = match self.mode() {
            CtrMode::Down => prd as u32 - count,
            _ => count,
        };
        self.pos.set(pos);
        self.phase.set(0);
    }

    // Cycle positions at which the selected interrupt event occurs
    fn event_positions(&self) -> ([u32; 2], usize) {
        let prd = self.tbprd.get() as u32;
        let (zero, period) = match self.mode() {
            CtrMode::Down => (prd, 0),
            _ => (0, prd),
        };
        match self.etsel.get() & ETSEL_INTSEL_MASK {
            x if x == IntSel::Zero as u16 => ([zero, 0], 1),
            x if x == IntSel::Period as u16 => ([period, 0], 1),
            x if x == IntSel::ZeroOrPeriod as u16 => ([zero, period], 2),
            _ => ([0, 0], 0),
        }
    }

    fn inten(&self) -> bool {
        self.etsel.get() & ETSEL_INTEN != 0
    }

    fn intprd(&self) -> u16 {
        self.etps.get() & ETPS_INTPRD_MASK
    }

    fn intcnt(&self) -> u16 {
        (self.etps.get() >> ETPS_INTCNT_SHIFT) & 0b11
    }

    fn set_intcnt(&self, count: u16) {
        let etps = self.etps.get() & !(0b11 << ETPS_INTCNT_SHIFT);
        self.etps.set(etps | ((count & 0b11) << ETPS_INTCNT_SHIFT));
    }
}

// Ticks from `pos` until the counter next arrives at `event`, in 1..=len
fn ticks_until(pos: u32, event: u32, len: u32) -> u64 {
    match (event + len - pos % len) % len {
        0 => len as u64,
        d => d as u64,
    }
}

impl RegisterFile {
    fn epwm_running(&self, n: u8) -> Option<u32> {
        if !self.epwm_clock_enabled(n) {
            return None;
        }
        self.epwm[n as usize].cycle_len()
    }

    pub(super) fn epwm_cycles_to_event(&self, n: u8) -> Option<u64> {
        let len = self.epwm_running(n)?;
        let block = &self.epwm[n as usize];
        // While the flag is latched, events cannot change anything but the drop count
        if !block.inten() || block.etflg.get() || block.intprd() == 0 {
            return None;
        }
        let (events, count) = block.event_positions();
        let ticks = events[..count]
            .iter()
            .map(|&event| ticks_until(block.pos.get(), event, len))
            .min()?;
        Some(ticks * block.divisor() - block.phase.get())
    }

    pub(super) fn epwm_advance(&self, n: u8, cycles: u64) {
        let len = match self.epwm_running(n) {
            Some(len) => len,
            None => return,
        };
        let block = &self.epwm[n as usize];
        let divisor = block.divisor();
        let total = block.phase.get().saturating_add(cycles);
        let ticks = total / divisor;
        block.phase.set(total % divisor);
        if ticks == 0 {
            return;
        }

        let pos = block.pos.get() % len;
        if block.inten() && block.intprd() != 0 {
            let (events, count) = block.event_positions();
            let arrivals: u64 = events[..count]
                .iter()
                .map(|&event| {
                    let first = ticks_until(pos, event, len);
                    if ticks >= first {
                        1 + (ticks - first) / len as u64
                    } else {
                        0
                    }
                })
                .sum();
            self.epwm_events(n, arrivals);
        }
        block.pos.set(((pos as u64 + ticks % len as u64) % len as u64) as u32);
    }

    // Event-trigger logic: INTCNT counts events until it reaches INTPRD, then ETFLG.INT is set and
    // the interrupt is raised. Events arriving while ETFLG.INT is set are lost.
    fn epwm_events(&self, n: u8, mut events: u64) {
        let block = &self.epwm[n as usize];
        while events > 0 && !block.etflg.get() {
            events -= 1;
            let count = block.intcnt() + 1;
            if count >= block.intprd() {
                block.set_intcnt(0);
                self.epwm_fire(n);
            } else {
                block.set_intcnt(count);
            }
        }
        if events > 0 {
            log::trace!("ePWM{}: {} event(s) dropped, ETFLG.INT set", n + 1, events);
            block.stats.drop_events(events);
        }
    }

    fn epwm_fire(&self, n: u8) {
        let block = &self.epwm[n as usize];
        block.etflg.set(true);
        block.stats.fire();
        self.raise(Line::Pie {
            group: EPWM_PIE_GROUP,
            channel: n,
        });
    }
}

impl EpwmRegs for RegisterFile {
    fn tbctl_wr(&self, n: u8, bits: u16) {
        let block = &self.epwm[n as usize];
        let count = block.counter();
        block.tbctl.set(bits);
        block.set_counter(count);
    }

    fn tbctl_rd(&self, n: u8) -> u16 {
        self.epwm[n as usize].tbctl.get()
    }

    fn tbprd_wr(&self, n: u8, period: u16) {
        let block = &self.epwm[n as usize];
        let count = block.counter();
        block.tbprd.set(period);
        block.set_counter(count);
    }

    fn tbprd_rd(&self, n: u8) -> u16 {
        self.epwm[n as usize].tbprd.get()
    }

    fn tbctr_wr(&self, n: u8, count: u16) {
        self.epwm[n as usize].set_counter(count);
    }

    fn tbctr_rd(&self, n: u8) -> u16 {
        self.epwm[n as usize].counter()
    }

    fn intsel_wr(&self, n: u8, sel: IntSel) {
        let etsel = &self.epwm[n as usize].etsel;
        etsel.set((etsel.get() & !ETSEL_INTSEL_MASK) | sel as u16);
    }

    fn inten_set(&self, n: u8) {
        let etsel = &self.epwm[n as usize].etsel;
        etsel.set(etsel.get() | ETSEL_INTEN);
    }

    fn inten_clear(&self, n: u8) {
        let etsel = &self.epwm[n as usize].etsel;
        etsel.set(etsel.get() & !ETSEL_INTEN);
    }

    fn inten_rd(&self, n: u8) -> bool {
        self.epwm[n as usize].inten()
    }

    fn intprd_wr(&self, n: u8, events: u8) {
        let block = &self.epwm[n as usize];
        let etps = block.etps.get() & !ETPS_INTPRD_MASK;
        block.etps.set(etps | (events as u16 & ETPS_INTPRD_MASK));
        block.set_intcnt(0);
    }

    fn intcnt_rd(&self, n: u8) -> u8 {
        self.epwm[n as usize].intcnt() as u8
    }

    fn etflg_int_rd(&self, n: u8) -> bool {
        self.epwm[n as usize].etflg.get()
    }

    fn etclr_int(&self, n: u8) {
        self.epwm[n as usize].etflg.set(false);
    }

    fn etfrc_int(&self, n: u8) {
        let block = &self.epwm[n as usize];
        if !block.inten() {
            return;
        }
        if block.etflg.get() {
            block.stats.drop_events(1);
        } else {
            self.epwm_fire(n);
            self.propagate();
        }
    }
}
