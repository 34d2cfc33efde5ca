//! ePWM time-base and event-trigger registers

/// Number of ePWM modules on the device
pub const EPWM_MODULES: u8 = 8;

/// Time-base counter mode (TBCTL.CTRMODE)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CtrMode {
    /// Count up from 0 to TBPRD, then wrap to 0
    Up = 0,
    /// Count down from TBPRD to 0, then reload TBPRD
    Down = 1,
    /// Count up to TBPRD, then back down to 0
    UpDown = 2,
    /// Counter stopped
    Freeze = 3,
}

impl CtrMode {
    /// Decode the two CTRMODE bits
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0 => CtrMode::Up,
            1 => CtrMode::Down,
            2 => CtrMode::UpDown,
            _ => CtrMode::Freeze,
        }
    }
}

/// High-speed time-base clock prescaler (TBCTL.HSPCLKDIV)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HspClkDiv {
    /// No division
    _1 = 0,
    /// Divide by 2 (reset value)
    _2 = 1,
    /// Divide by 4
    _4 = 2,
    /// Divide by 6
    _6 = 3,
    /// Divide by 8
    _8 = 4,
    /// Divide by 10
    _10 = 5,
    /// Divide by 12
    _12 = 6,
    /// Divide by 14
    _14 = 7,
}

impl HspClkDiv {
    /// Divisor encoded by the three HSPCLKDIV bits
    #[inline]
    pub const fn divisor_of(bits: u16) -> u32 {
        match bits & 0b111 {
            0 => 1,
            n => 2 * n as u32,
        }
    }
}

/// Time-base clock prescaler (TBCTL.CLKDIV)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClkDiv {
    /// No division
    _1 = 0,
    /// Divide by 2
    _2 = 1,
    /// Divide by 4
    _4 = 2,
    /// Divide by 8
    _8 = 3,
    /// Divide by 16
    _16 = 4,
    /// Divide by 32
    _32 = 5,
    /// Divide by 64
    _64 = 6,
    /// Divide by 128
    _128 = 7,
}

impl ClkDiv {
    /// Divisor encoded by the three CLKDIV bits
    #[inline]
    pub const fn divisor_of(bits: u16) -> u32 {
        1 << (bits & 0b111)
    }
}

/// Emulation behaviour when the debugger halts the CPU (TBCTL.FREE_SOFT)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FreeSoft {
    /// Stop after the next counter increment or decrement
    StopAfterNext = 0,
    /// Stop when the counter completes a whole cycle
    StopAtCycleEnd = 1,
    /// Free run
    Free = 2,
}

/// Event that raises EPWMx_INT (ETSEL.INTSEL)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntSel {
    /// TBCTR = 0
    Zero = 1,
    /// TBCTR = TBPRD
    Period = 2,
    /// TBCTR = 0 or TBCTR = TBPRD
    ZeroOrPeriod = 3,
}

pub(crate) const TBCTL_CTRMODE_SHIFT: u16 = 0;
pub(crate) const TBCTL_HSPCLKDIV_SHIFT: u16 = 7;
pub(crate) const TBCTL_CLKDIV_SHIFT: u16 = 10;
pub(crate) const TBCTL_FREE_SOFT_SHIFT: u16 = 14;

/// Assemble a TBCTL value from its fields
#[inline]
pub const fn tbctl_bits(mode: CtrMode, hsp: HspClkDiv, clk: ClkDiv, free_soft: FreeSoft) -> u16 {
    ((mode as u16) << TBCTL_CTRMODE_SHIFT)
        | ((hsp as u16) << TBCTL_HSPCLKDIV_SHIFT)
        | ((clk as u16) << TBCTL_CLKDIV_SHIFT)
        | ((free_soft as u16) << TBCTL_FREE_SOFT_SHIFT)
}

/// Time-base and event-trigger registers of ePWM module `n` (zero-based)
pub trait EpwmRegs {
    /// Overwrite TBCTL
    fn tbctl_wr(&self, n: u8, bits: u16);
    /// TBCTL
    fn tbctl_rd(&self, n: u8) -> u16;

    /// TBPRD
    fn tbprd_wr(&self, n: u8, period: u16);
    /// TBPRD
    fn tbprd_rd(&self, n: u8) -> u16;

    /// TBCTR
    fn tbctr_wr(&self, n: u8, count: u16);
    /// TBCTR
    fn tbctr_rd(&self, n: u8) -> u16;

    /// ETSEL.INTSEL
    fn intsel_wr(&self, n: u8, sel: IntSel);
    /// ETSEL.INTEN = 1
    fn inten_set(&self, n: u8);
    /// ETSEL.INTEN = 0
    fn inten_clear(&self, n: u8);
    /// ETSEL.INTEN
    fn inten_rd(&self, n: u8) -> bool;

    /// ETPS.INTPRD, events per interrupt (0 disables, max 3)
    fn intprd_wr(&self, n: u8, events: u8);
    /// ETPS.INTCNT
    fn intcnt_rd(&self, n: u8) -> u8;

    /// ETFLG.INT
    fn etflg_int_rd(&self, n: u8) -> bool;
    /// ETCLR.INT = 1: clear ETFLG.INT so the module may raise the next interrupt
    fn etclr_int(&self, n: u8);
    /// ETFRC.INT = 1: force an interrupt event
    fn etfrc_int(&self, n: u8);
}
