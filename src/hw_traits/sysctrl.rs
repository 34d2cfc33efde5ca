//! System control: EALLOW protection, PLL and peripheral clock gating

use bitflags::bitflags;

bitflags! {
    /// PCLKCR1: ePWM module clock enables
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Pclkcr1: u16 {
        /// ePWM1 clock
        const EPWM1ENCLK = 1 << 0;
        /// ePWM2 clock
        const EPWM2ENCLK = 1 << 1;
        /// ePWM3 clock
        const EPWM3ENCLK = 1 << 2;
        /// ePWM4 clock
        const EPWM4ENCLK = 1 << 3;
        /// ePWM5 clock
        const EPWM5ENCLK = 1 << 4;
        /// ePWM6 clock
        const EPWM6ENCLK = 1 << 5;
        /// ePWM7 clock
        const EPWM7ENCLK = 1 << 6;
        /// ePWM8 clock
        const EPWM8ENCLK = 1 << 7;
    }
}

bitflags! {
    /// PCLKCR3: CPU timer and GPIO input clock enables
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Pclkcr3: u16 {
        /// CPU timer 0 clock
        const CPUTIMER0ENCLK = 1 << 8;
        /// CPU timer 1 clock
        const CPUTIMER1ENCLK = 1 << 9;
        /// CPU timer 2 clock
        const CPUTIMER2ENCLK = 1 << 10;
        /// GPIO input qualification clock
        const GPIOINENCLK = 1 << 13;
    }
}

/// System control registers and the EALLOW status bit
pub trait SysCtrlRegs {
    /// Set EALLOW, opening protected registers for writing
    fn eallow(&self);
    /// Clear EALLOW
    fn edis(&self);
    /// Current EALLOW state
    fn eallow_rd(&self) -> bool;

    /// PLLCR.DIV, the PLL multiplier. 0 bypasses the PLL. Protected.
    fn pllcr_wr(&self, div: u8);
    /// PLLCR.DIV
    fn pllcr_rd(&self) -> u8;
    /// PLLSTS.DIVSEL, the SYSCLKOUT divider select. Protected.
    fn divsel_wr(&self, divsel: u8);
    /// PLLSTS.DIVSEL
    fn divsel_rd(&self) -> u8;
    /// PLLSTS.PLLLOCKS
    fn plllocks_rd(&self) -> bool;

    /// PCLKCR1
    fn pclkcr1_rd(&self) -> Pclkcr1;
    /// Set bits in PCLKCR1. Protected.
    fn pclkcr1_set(&self, bits: Pclkcr1);
    /// Clear bits in PCLKCR1. Protected.
    fn pclkcr1_clear(&self, bits: Pclkcr1);

    /// PCLKCR3
    fn pclkcr3_rd(&self) -> Pclkcr3;
    /// Set bits in PCLKCR3. Protected.
    fn pclkcr3_set(&self, bits: Pclkcr3);
    /// Clear bits in PCLKCR3. Protected.
    fn pclkcr3_clear(&self, bits: Pclkcr3);
}

/// Run `f` with EALLOW set. EALLOW is restored to its previous state afterwards, so nested calls
/// are fine.
#[inline]
pub fn protected<S: SysCtrlRegs + ?Sized, T>(regs: &S, f: impl FnOnce() -> T) -> T {
    let was_allowed = regs.eallow_rd();
    regs.eallow();
    let out = f();
    if !was_allowed {
        regs.edis();
    }
    out
}
