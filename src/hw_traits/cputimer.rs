//! CPU timer registers

use bitflags::bitflags;

/// Number of CPU timers
pub const CPU_TIMERS: u8 = 3;

bitflags! {
    /// CPU timer control register (TCR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Tcr: u16 {
        /// Timer stop status: 1 stops the timer
        const TSS = 1 << 4;
        /// Timer reload: writing 1 loads PRD into TIM and TDDR into PSC. Reads as 0.
        const TRB = 1 << 5;
        /// Emulation soft stop
        const SOFT = 1 << 10;
        /// Emulation free run
        const FREE = 1 << 11;
        /// Timer interrupt enable
        const TIE = 1 << 14;
        /// Timer interrupt flag, set on every underflow
        const TIF = 1 << 15;
    }
}

/// Registers of CPU timer `n` (zero-based)
pub trait CpuTimerRegs {
    /// PRDH:PRD
    fn prd_wr(&self, n: u8, period: u32);
    /// PRDH:PRD
    fn prd_rd(&self, n: u8) -> u32;
    /// TIMH:TIM, the down-counter
    fn tim_rd(&self, n: u8) -> u32;

    /// TDDRH:TDDR, the prescaler reload value
    fn tddr_wr(&self, n: u8, prescale: u16);
    /// TDDRH:TDDR
    fn tddr_rd(&self, n: u8) -> u16;

    /// TCR
    fn tcr_rd(&self, n: u8) -> Tcr;
    /// Set bits in TCR. TIF is not writable this way.
    fn tcr_set(&self, n: u8, bits: Tcr);
    /// Clear bits in TCR. TIF is not writable this way.
    fn tcr_clear(&self, n: u8, bits: Tcr);
    /// TCR.TIF is write-1-to-clear
    fn tif_clr(&self, n: u8);
}
