//! PIE and core interrupt registers

use bitflags::bitflags;

/// Number of PIE groups, one per core line INT1-INT12
pub const PIE_GROUPS: u8 = 12;

bitflags! {
    /// Core interrupt lines, as laid out in IER and IFR
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IntFlags: u16 {
        /// INT1, fed by PIE group 1
        const INT1 = 1 << 0;
        /// INT2, fed by PIE group 2
        const INT2 = 1 << 1;
        /// INT3, fed by PIE group 3
        const INT3 = 1 << 2;
        /// INT4, fed by PIE group 4
        const INT4 = 1 << 3;
        /// INT5, fed by PIE group 5
        const INT5 = 1 << 4;
        /// INT6, fed by PIE group 6
        const INT6 = 1 << 5;
        /// INT7, fed by PIE group 7
        const INT7 = 1 << 6;
        /// INT8, fed by PIE group 8
        const INT8 = 1 << 7;
        /// INT9, fed by PIE group 9
        const INT9 = 1 << 8;
        /// INT10, fed by PIE group 10
        const INT10 = 1 << 9;
        /// INT11, fed by PIE group 11
        const INT11 = 1 << 10;
        /// INT12, fed by PIE group 12
        const INT12 = 1 << 11;
        /// INT13, wired to CPU timer 1
        const INT13 = 1 << 12;
        /// INT14, wired to CPU timer 2
        const INT14 = 1 << 13;
        /// Data logging interrupt
        const DLOGINT = 1 << 14;
        /// Real-time OS interrupt
        const RTOSINT = 1 << 15;
    }
}

/// PIE control registers and the core interrupt registers (IER, IFR, INTM) they feed.
/// `group` arguments are zero-based (group 1 is 0); channel bitmasks have INTx1 in bit 0.
pub trait PieRegs {
    /// PIECTRL.ENPIE
    fn enpie_wr(&self, enable: bool);
    /// PIECTRL.ENPIE
    fn enpie_rd(&self) -> bool;

    /// PIEIERx
    fn pieier_rd(&self, group: u8) -> u8;
    /// Set bits in PIEIERx
    fn pieier_set(&self, group: u8, bits: u8);
    /// Clear bits in PIEIERx
    fn pieier_clear(&self, group: u8, bits: u8);

    /// PIEIFRx
    fn pieifr_rd(&self, group: u8) -> u8;
    /// Clear bits in PIEIFRx
    fn pieifr_clear(&self, group: u8, bits: u8);

    /// PIEACK, one bit per group
    fn pieack_rd(&self) -> u16;
    /// PIEACK is write-1-to-clear. Clearing a bit lets the group reach the core again.
    fn pieack_clr(&self, bits: u16);

    /// IER
    fn ier_rd(&self) -> IntFlags;
    /// Overwrite IER
    fn ier_wr(&self, flags: IntFlags);
    /// Set bits in IER
    fn ier_set(&self, flags: IntFlags);
    /// Clear bits in IER
    fn ier_clear(&self, flags: IntFlags);

    /// IFR
    fn ifr_rd(&self) -> IntFlags;
    /// Clear bits in IFR
    fn ifr_clear(&self, flags: IntFlags);

    /// Set INTM (`DINT`)
    fn intm_set(&self);
    /// Clear INTM (`EINT`)
    fn intm_clear(&self);
    /// INTM, `true` while maskable interrupts are disabled
    fn intm_rd(&self) -> bool;
}
