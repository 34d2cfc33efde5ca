use super::RegisterFile;
use crate::hw_traits::pie::{IntFlags, PieRegs, PIE_GROUPS};
use crate::util::BitsExt;
use core::cell::Cell;

pub(super) struct PieBlock {
    enpie: Cell<bool>,
    pieier: [Cell<u8>; PIE_GROUPS as usize],
    pieifr: [Cell<u8>; PIE_GROUPS as usize],
    pieack: Cell<u16>,
    ier: Cell<IntFlags>,
    ifr: Cell<IntFlags>,
    intm: Cell<bool>,
}

impl PieBlock {
    pub(super) fn new() -> Self {
        PieBlock {
            enpie: Cell::new(false),
            pieier: Default::default(),
            pieifr: Default::default(),
            pieack: Cell::new(0),
            ier: Cell::new(IntFlags::empty()),
            ifr: Cell::new(IntFlags::empty()),
            intm: Cell::new(true),
        }
    }
}

impl RegisterFile {
    pub(super) fn pie_raise(&self, group: u8, channel: u8) {
        let ifr = &self.pie.pieifr[group as usize];
        ifr.set(ifr.get() | (1 << channel));
        log::trace!("PIE {}.{} raised", group + 1, channel + 1);
    }

    pub(super) fn core_raise(&self, bit: u8) {
        let flag = IntFlags::from_bits_truncate(1 << bit);
        if self.pie.ifr.get().contains(flag) {
            log::trace!("INT{} already pending, event coalesced", bit + 1);
        }
        self.pie.ifr.set(self.pie.ifr.get() | flag);
    }

    // A group reaches the core when one of its enabled channels is flagged and its PIEACK bit is
    // clear. Reaching the core latches PIEACK until software writes it back.
    pub(super) fn propagate(&self) {
        if !self.pie.enpie.get() {
            return;
        }
        for group in 0..PIE_GROUPS {
            let ack = self.pie.pieack.get();
            if ack.check(group) {
                continue;
            }
            let pending =
                self.pie.pieifr[group as usize].get() & self.pie.pieier[group as usize].get();
            if pending != 0 {
                self.pie.pieack.set(ack.set(group));
                let flag = IntFlags::from_bits_truncate(1 << group);
                self.pie.ifr.set(self.pie.ifr.get() | flag);
                log::trace!("PIE group {} latched onto INT{}", group + 1, group + 1);
            }
        }
    }
}

impl PieRegs for RegisterFile {
    fn enpie_wr(&self, enable: bool) {
        self.pie.enpie.set(enable);
        self.propagate();
    }

    fn enpie_rd(&self) -> bool {
        self.pie.enpie.get()
    }

    fn pieier_rd(&self, group: u8) -> u8 {
        self.pie.pieier[group as usize].get()
    }

    fn pieier_set(&self, group: u8, bits: u8) {
        let ier = &self.pie.pieier[group as usize];
        ier.set(ier.get().set_mask(bits));
        self.propagate();
    }

    fn pieier_clear(&self, group: u8, bits: u8) {
        let ier = &self.pie.pieier[group as usize];
        ier.set(ier.get().clear_mask(bits));
    }

    fn pieifr_rd(&self, group: u8) -> u8 {
        self.pie.pieifr[group as usize].get()
    }

    fn pieifr_clear(&self, group: u8, bits: u8) {
        let ifr = &self.pie.pieifr[group as usize];
        ifr.set(ifr.get().clear_mask(bits));
    }

    fn pieack_rd(&self) -> u16 {
        self.pie.pieack.get()
    }

    fn pieack_clr(&self, bits: u16) {
        self.pie.pieack.set(self.pie.pieack.get().clear_mask(bits));
        self.propagate();
    }

    fn ier_rd(&self) -> IntFlags {
        self.pie.ier.get()
    }

    fn ier_wr(&self, flags: IntFlags) {
        self.pie.ier.set(flags);
    }

    fn ier_set(&self, flags: IntFlags) {
        self.pie.ier.set(self.pie.ier.get() | flags);
    }

    fn ier_clear(&self, flags: IntFlags) {
        self.pie.ier.set(self.pie.ier.get() - flags);
    }

    fn ifr_rd(&self) -> IntFlags {
        self.pie.ifr.get()
    }

    fn ifr_clear(&self, flags: IntFlags) {
        self.pie.ifr.set(self.pie.ifr.get() - flags);
    }

    fn intm_set(&self) {
        self.pie.intm.set(true);
    }

    fn intm_clear(&self) {
        self.pie.intm.set(false);
    }

    fn intm_rd(&self) -> bool {
        self.pie.intm.get()
    }
}
