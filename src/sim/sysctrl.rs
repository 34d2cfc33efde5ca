use super::RegisterFile;
use crate::hw_traits::sysctrl::{Pclkcr1, Pclkcr3, SysCtrlRegs};
use core::cell::Cell;

pub(super) struct SysCtrlBlock {
    pllcr: Cell<u8>,
    divsel: Cell<u8>,
    plllocks: Cell<bool>,
    pclkcr1: Cell<Pclkcr1>,
    pclkcr3: Cell<Pclkcr3>,
}

impl SysCtrlBlock {
    pub(super) fn new() -> Self {
        SysCtrlBlock {
            pllcr: Cell::new(0),
            divsel: Cell::new(0),
            plllocks: Cell::new(true),
            pclkcr1: Cell::new(Pclkcr1::empty()),
            pclkcr3: Cell::new(Pclkcr3::empty()),
        }
    }
}

impl RegisterFile {
    pub(super) fn epwm_clock_enabled(&self, n: u8) -> bool {
        self.sysctrl
            .pclkcr1
            .get()
            .contains(Pclkcr1::from_bits_truncate(1 << n))
    }

    pub(super) fn timer_clock_enabled(&self, n: u8) -> bool {
        self.sysctrl
            .pclkcr3
            .get()
            .contains(Pclkcr3::from_bits_truncate(Pclkcr3::CPUTIMER0ENCLK.bits() << n))
    }
}

impl SysCtrlRegs for RegisterFile {
    fn eallow(&self) {
        self.eallow.set(true);
    }

    fn edis(&self) {
        self.eallow.set(false);
    }

    fn eallow_rd(&self) -> bool {
        self.eallow.get()
    }

    fn pllcr_wr(&self, div: u8) {
        if !self.allowed("PLLCR") {
            return;
        }
        if self.sysctrl.divsel.get() > 1 {
            log::warn!("PLLCR changed while DIVSEL is not /4");
        }
        self.sysctrl.pllcr.set(div & 0x1F);
        // The modelled PLL locks as soon as it is programmed
        self.sysctrl.plllocks.set(true);
    }

    fn pllcr_rd(&self) -> u8 {
        self.sysctrl.pllcr.get()
    }

    fn divsel_wr(&self, divsel: u8) {
        if self.allowed("PLLSTS.DIVSEL") {
            self.sysctrl.divsel.set(divsel & 0b11);
        }
    }

    fn divsel_rd(&self) -> u8 {
        self.sysctrl.divsel.get()
    }

    fn plllocks_rd(&self) -> bool {
        self.sysctrl.plllocks.get()
    }

    fn pclkcr1_rd(&self) -> Pclkcr1 {
        self.sysctrl.pclkcr1.get()
    }

    fn pclkcr1_set(&self, bits: Pclkcr1) {
        if self.allowed("PCLKCR1") {
            self.sysctrl.pclkcr1.set(self.sysctrl.pclkcr1.get() | bits);
        }
    }

    fn pclkcr1_clear(&self, bits: Pclkcr1) {
        if self.allowed("PCLKCR1") {
            self.sysctrl.pclkcr1.set(self.sysctrl.pclkcr1.get() - bits);
        }
    }

    fn pclkcr3_rd(&self) -> Pclkcr3 {
        self.sysctrl.pclkcr3.get()
    }

    fn pclkcr3_set(&self, bits: Pclkcr3) {
        if self.allowed("PCLKCR3") {
            self.sysctrl.pclkcr3.set(self.sysctrl.pclkcr3.get() | bits);
        }
    }

    fn pclkcr3_clear(&self, bits: Pclkcr3) {
        if self.allowed("PCLKCR3") {
            self.sysctrl.pclkcr3.set(self.sysctrl.pclkcr3.get() - bits);
        }
    }
}
